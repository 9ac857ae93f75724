use std::collections::BTreeMap;

use tracing::warn;

use crate::app::catalog::CatalogSource;
use crate::app::error::Result;
use crate::app::models::{ColumnInfo, KeyRole};
use crate::app::reader::{CatalogReader, ForeignKeyFilter};

/// Column-level lookups on top of a [`CatalogReader`].
pub struct ColumnResolver<'a, S> {
    reader: &'a CatalogReader<S>,
}

impl<'a, S: CatalogSource> ColumnResolver<'a, S> {
    pub fn new(reader: &'a CatalogReader<S>) -> Self {
        Self { reader }
    }

    /// Primary key columns in ordinal order; empty when none is declared.
    pub async fn primary_key_of(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let columns = self.reader.list_columns(table).await?;
        Ok(primary_key(&columns))
    }

    /// The column a foreign-key column points at.
    pub async fn referenced_column_of(&self, column: &ColumnInfo) -> Result<Option<ColumnInfo>> {
        let edges = self.reader.foreign_keys_of(&column.table_name).await?;
        let Some((table, target)) = edges
            .iter()
            .find(|e| e.column_name == column.name)
            .and_then(|e| e.target())
        else {
            return Ok(None);
        };

        let found = self
            .reader
            .list_columns(table)
            .await?
            .into_iter()
            .find(|c| c.name == target);
        if found.is_none() {
            warn!(
                column = %format!("{}.{}", column.table_name, column.name),
                target = %format!("{table}.{target}"),
                "foreign key points at a missing column"
            );
        }
        Ok(found)
    }

    /// Columns of other tables whose foreign keys point at `column`.
    pub async fn referencing_columns_of(&self, column: &ColumnInfo) -> Result<Vec<ColumnInfo>> {
        let edges = self
            .reader
            .list_foreign_keys(&ForeignKeyFilter::to_table(&column.table_name))
            .await?;

        let mut columns_by_table: BTreeMap<String, Vec<ColumnInfo>> = BTreeMap::new();
        let mut referencing = Vec::new();
        for edge in edges
            .iter()
            .filter(|e| e.target().is_some_and(|(_, c)| c == column.name))
        {
            if !columns_by_table.contains_key(&edge.table_name) {
                let columns = self.reader.list_columns(&edge.table_name).await?;
                columns_by_table.insert(edge.table_name.clone(), columns);
            }
            let source = columns_by_table
                .get(&edge.table_name)
                .and_then(|cols| cols.iter().find(|c| c.name == edge.column_name));
            match source {
                Some(source) => referencing.push(source.clone()),
                None => warn!(
                    constraint = %edge.constraint_name,
                    "key usage names a column missing from its table"
                ),
            }
        }
        Ok(referencing)
    }
}

/// Filters `columns` to the primary key, ordered by ordinal position.
pub fn primary_key(columns: &[ColumnInfo]) -> Vec<ColumnInfo> {
    let mut key: Vec<ColumnInfo> = columns
        .iter()
        .filter(|c| c.key == KeyRole::Primary)
        .cloned()
        .collect();
    key.sort_by_key(|c| c.ordinal_position);
    key
}
