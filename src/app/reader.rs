use tracing::debug;

use crate::app::catalog::{CatalogQuery, CatalogRow, CatalogSource, CatalogView, Predicate, field};
use crate::app::dialect::Dialect;
use crate::app::error::{CatalogError, Result};
use crate::app::models::{CatalogSnapshot, ColumnInfo, ForeignKeyEdge, TableInfo};

/// Operational tables that never count as domain entities.
pub const DEFAULT_IGNORED_TABLES: &[&str] = &["failed_jobs", "migrations", "password_resets"];

/// Static configuration of a [`CatalogReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub dialect: Dialect,
    pub database: String,
    pub ignored_tables: Vec<String>,
}

impl ReaderConfig {
    pub fn new(dialect: Dialect, database: impl Into<String>) -> Self {
        Self {
            dialect,
            database: database.into(),
            ignored_tables: DEFAULT_IGNORED_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Adds tables to the deny-list on top of the defaults.
    pub fn ignore<I, T>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for table in tables {
            let table = table.into();
            if !self.ignored_tables.contains(&table) {
                self.ignored_tables.push(table);
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    /// Restrict to these names.
    pub names: Option<Vec<String>>,
    /// Only tables carrying a non-empty comment.
    pub commented_only: bool,
}

impl TableFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            names: Some(vec![name.into()]),
            commented_only: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKeyFilter {
    /// Edges sourced from one of these tables.
    pub source_tables: Option<Vec<String>>,
    /// Edges pointing at one of these tables.
    pub referenced_tables: Option<Vec<String>>,
}

impl ForeignKeyFilter {
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            source_tables: Some(vec![table.into()]),
            referenced_tables: None,
        }
    }

    pub fn to_table(table: impl Into<String>) -> Self {
        Self {
            source_tables: None,
            referenced_tables: Some(vec![table.into()]),
        }
    }
}

/// Reads tables, columns and foreign keys of the configured database.
///
/// Every query is scoped to the database's catalog identity and skips the
/// deny-listed tables. Field names are normalized before rows are decoded.
pub struct CatalogReader<S> {
    source: S,
    config: ReaderConfig,
    catalog: String,
    schema: String,
}

impl<S: CatalogSource> CatalogReader<S> {
    pub fn new(source: S, config: ReaderConfig) -> Self {
        let (catalog, schema) = config.dialect.catalog_identity(&config.database);
        Self {
            source,
            config,
            catalog,
            schema,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub async fn list_tables(&self, filter: &TableFilter) -> Result<Vec<TableInfo>> {
        let mut query = CatalogQuery::new(CatalogView::Tables);
        if let Some(names) = &filter.names {
            query = query.filter(Predicate::In(field::TABLE_NAME, names.clone()));
        }
        if filter.commented_only {
            query = query.filter(Predicate::NotBlank(field::TABLE_COMMENT));
        }
        let rows = self.fetch(query.order_by(field::TABLE_NAME)).await?;
        rows.iter().map(TableInfo::try_from).collect()
    }

    /// A single table, or `NotFound` when it is absent or deny-listed.
    pub async fn table(&self, name: &str) -> Result<TableInfo> {
        self.list_tables(&TableFilter::named(name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::table_not_found(name))
    }

    /// Columns of `table` in ordinal order.
    pub async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let query = CatalogQuery::new(CatalogView::Columns)
            .filter(Predicate::Eq(field::TABLE_NAME, table.to_string()))
            .order_by(field::ORDINAL_POSITION);
        let rows = self.fetch(query).await?;
        rows.iter().map(ColumnInfo::try_from).collect()
    }

    /// Key usages with a referenced table and column, by constraint name.
    pub async fn list_foreign_keys(&self, filter: &ForeignKeyFilter) -> Result<Vec<ForeignKeyEdge>> {
        let mut query = foreign_key_query();
        if let Some(tables) = &filter.source_tables {
            query = query.filter(Predicate::In(field::TABLE_NAME, tables.clone()));
        }
        if let Some(tables) = &filter.referenced_tables {
            query = query.filter(Predicate::In(field::REFERENCED_TABLE_NAME, tables.clone()));
        }
        let rows = self.fetch(query).await?;
        rows.iter().map(ForeignKeyEdge::try_from).collect()
    }

    pub async fn foreign_keys_of(&self, table: &str) -> Result<Vec<ForeignKeyEdge>> {
        self.list_foreign_keys(&ForeignKeyFilter::from_table(table)).await
    }

    /// Reads everything the relationship inference for `table` needs.
    ///
    /// Edges cover the table's own foreign keys, the keys pointing at it, and
    /// every key of the tables pointing at it (the junction candidates).
    pub async fn snapshot_for(&self, table: &str) -> Result<CatalogSnapshot> {
        let tables = self.list_tables(&TableFilter::default()).await?;
        let columns = self.list_columns(table).await?;

        let pointing_here = self.scope(
            CatalogQuery::new(CatalogView::KeyColumnUsage)
                .filter(Predicate::Eq(field::REFERENCED_TABLE_NAME, table.to_string())),
        );
        let query = foreign_key_query().filter(Predicate::Any(vec![
            Predicate::Eq(field::TABLE_NAME, table.to_string()),
            Predicate::Eq(field::REFERENCED_TABLE_NAME, table.to_string()),
            Predicate::InSubquery {
                field: field::TABLE_NAME,
                select: field::TABLE_NAME,
                query: Box::new(pointing_here),
            },
        ]));
        let edges = self
            .fetch(query)
            .await?
            .iter()
            .map(ForeignKeyEdge::try_from)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            table,
            tables = tables.len(),
            columns = columns.len(),
            edges = edges.len(),
            "catalog snapshot read"
        );
        Ok(CatalogSnapshot {
            tables,
            columns,
            edges,
        })
    }

    fn scope(&self, query: CatalogQuery) -> CatalogQuery {
        query
            .filter(Predicate::Eq(field::TABLE_CATALOG, self.catalog.clone()))
            .filter(Predicate::Eq(field::TABLE_SCHEMA, self.schema.clone()))
            .filter(Predicate::NotIn(
                field::TABLE_NAME,
                self.config.ignored_tables.clone(),
            ))
    }

    async fn fetch(&self, query: CatalogQuery) -> Result<Vec<CatalogRow>> {
        let query = self.scope(query);
        let rows = self.source.fetch(&query).await?;
        debug!(view = query.view.name(), rows = rows.len(), "catalog rows fetched");
        let dialect = self.config.dialect;
        Ok(rows
            .into_iter()
            .map(|row| {
                row.fields()
                    .map(|(name, value)| (dialect.normalize_field_name(name), value.map(str::to_string)))
                    .collect()
            })
            .collect())
    }
}

fn foreign_key_query() -> CatalogQuery {
    CatalogQuery::new(CatalogView::KeyColumnUsage)
        .filter(Predicate::NotBlank(field::REFERENCED_TABLE_NAME))
        .filter(Predicate::NotBlank(field::REFERENCED_COLUMN_NAME))
        .order_by(field::CONSTRAINT_NAME)
        .order_by(field::ORDINAL_POSITION)
}
