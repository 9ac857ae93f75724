use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::app::catalog::CatalogSource;
use crate::app::error::Result;
use crate::app::models::{
    BelongsTo, BelongsToMany, CatalogSnapshot, ForeignKeyEdge, HasMany, RelationshipSet, TableInfo,
};
use crate::app::naming;
use crate::app::reader::CatalogReader;

/// Derives a table's relationships from foreign-key metadata.
pub struct RelationshipInferencer<'a, S> {
    reader: &'a CatalogReader<S>,
}

impl<'a, S: CatalogSource> RelationshipInferencer<'a, S> {
    pub fn new(reader: &'a CatalogReader<S>) -> Self {
        Self { reader }
    }

    /// Reads one catalog snapshot and computes all three relationship kinds from it.
    pub async fn relationships_of(&self, table: &TableInfo) -> Result<RelationshipSet> {
        let snapshot = self.reader.snapshot_for(&table.name).await?;
        Ok(infer(table, &snapshot))
    }
}

pub fn infer(table: &TableInfo, snapshot: &CatalogSnapshot) -> RelationshipSet {
    RelationshipSet {
        belongs_to: belongs_to(table, snapshot),
        has_many: has_many(table, snapshot),
        belongs_to_many: belongs_to_many(table, snapshot),
    }
}

/// Outgoing edges: `table` holds the key.
pub fn belongs_to(table: &TableInfo, snapshot: &CatalogSnapshot) -> Vec<BelongsTo> {
    snapshot
        .edges
        .iter()
        .filter(|edge| edge.table_name == table.name)
        .filter_map(|edge| {
            let (other_table, other_column) = edge.target()?;
            let related = related_table(snapshot, other_table);
            let nullable = match snapshot.column(&table.name, &edge.column_name) {
                Ok(column) => column.nullable,
                Err(err) => {
                    warn!(constraint = %edge.constraint_name, %err, "assuming non-nullable key");
                    false
                }
            };
            Some(BelongsTo {
                relation_name: naming::relation_name(&edge.column_name),
                related_table: other_table.to_string(),
                related_model: related.map(TableInfo::names).map(|n| n.model),
                related_comment: related.map(|t| t.comment.clone()),
                own_column: edge.column_name.clone(),
                other_table: other_table.to_string(),
                other_column: other_column.to_string(),
                nullable,
            })
        })
        .collect()
}

/// Incoming edges from commented tables.
pub fn has_many(table: &TableInfo, snapshot: &CatalogSnapshot) -> Vec<HasMany> {
    snapshot
        .edges
        .iter()
        .filter_map(|edge| {
            let (_, own_column) = edge.target().filter(|(t, _)| *t == table.name)?;
            let child = related_table(snapshot, &edge.table_name)?;
            if !child.has_comment() {
                debug!(table = %child.name, "skipping comment-less child table");
                return None;
            }
            Some(HasMany {
                relation_name: child.name.clone(),
                related_table: child.name.clone(),
                related_model: Some(child.names().model),
                related_comment: Some(child.comment.clone()),
                own_column: own_column.to_string(),
                other_table: child.name.clone(),
                other_column: edge.column_name.clone(),
            })
        })
        .collect()
}

/// Tables reached through a comment-less junction table.
///
/// Each junction contributes one entry. When a junction has several keys to
/// qualifying tables, they are visited in constraint-name order and the last
/// one wins.
pub fn belongs_to_many(table: &TableInfo, snapshot: &CatalogSnapshot) -> Vec<BelongsToMany> {
    if !table.has_comment() {
        return Vec::new();
    }

    let incoming = sorted_by_constraint(
        snapshot
            .edges
            .iter()
            .filter(|e| e.references(&table.name) && e.table_name != table.name),
    );

    let mut by_junction: BTreeMap<String, BelongsToMany> = BTreeMap::new();
    for inbound in incoming {
        let Some(junction) = related_table(snapshot, &inbound.table_name) else {
            continue;
        };
        if junction.has_comment() {
            continue;
        }

        let outbound = sorted_by_constraint(snapshot.edges.iter().filter(|e| {
            e.table_name == junction.name
                && e.target().is_some_and(|(t, _)| t != table.name)
        }));
        for edge in outbound {
            let Some((other, _)) = edge.target() else {
                continue;
            };
            let Some(related) = related_table(snapshot, other).filter(|t| t.has_comment()) else {
                continue;
            };
            by_junction.insert(
                junction.name.clone(),
                BelongsToMany {
                    relation_name: related.name.clone(),
                    relation_table: junction.name.clone(),
                    related_table: related.name.clone(),
                    related_model: Some(related.names().model),
                    related_comment: Some(related.comment.clone()),
                    own_column: inbound.column_name.clone(),
                    other_column: edge.column_name.clone(),
                },
            );
        }
    }
    by_junction.into_values().collect()
}

fn sorted_by_constraint<'e>(edges: impl Iterator<Item = &'e ForeignKeyEdge>) -> Vec<&'e ForeignKeyEdge> {
    let mut edges: Vec<_> = edges.collect();
    edges.sort_by(|a, b| a.constraint_name.cmp(&b.constraint_name));
    edges
}

fn related_table<'s>(snapshot: &'s CatalogSnapshot, name: &str) -> Option<&'s TableInfo> {
    match snapshot.table(name) {
        Ok(table) => Some(table),
        Err(err) => {
            warn!(%err, "dangling foreign key");
            None
        }
    }
}
