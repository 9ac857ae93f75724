#![allow(dead_code)]

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schema_graph::{
    CatalogError, CatalogQuery, CatalogReader, CatalogRow, CatalogSource, CatalogView, Dialect,
    Predicate, ReaderConfig,
};

/// An information schema held in memory.
///
/// Rows are keyed the way the backend reports field names (upper case for
/// MySQL), so readers built on top of it exercise normalization.
pub(crate) struct MemoryCatalog {
    dialect: Dialect,
    catalog: String,
    schema: String,
    tables: Vec<CatalogRow>,
    columns: Vec<CatalogRow>,
    key_usages: Vec<CatalogRow>,
    queries: Mutex<Vec<CatalogQuery>>,
}

impl MemoryCatalog {
    pub(crate) fn new(dialect: Dialect, database: &str) -> Self {
        let (catalog, schema) = dialect.catalog_identity(database);
        Self {
            dialect,
            catalog,
            schema,
            tables: Vec::new(),
            columns: Vec::new(),
            key_usages: Vec::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn mysql(database: &str) -> Self {
        Self::new(Dialect::MySql, database)
    }

    fn row(&self, schema: &str, table: &str) -> CatalogRow {
        CatalogRow::new()
            .with(&self.key("table_catalog"), Some(self.catalog.as_str()))
            .with(&self.key("table_schema"), Some(schema))
            .with(&self.key("table_name"), Some(table))
    }

    fn key(&self, field: &str) -> String {
        self.dialect.identifier(field)
    }

    fn set(&self, row: CatalogRow, field: &str, value: Option<&str>) -> CatalogRow {
        row.with(&self.key(field), value)
    }

    pub(crate) fn table(self, name: &str, comment: &str) -> Self {
        let schema = self.schema.clone();
        self.table_in(&schema, name, comment)
    }

    pub(crate) fn table_in(mut self, schema: &str, name: &str, comment: &str) -> Self {
        let row = self.row(schema, name);
        let row = self.set(row, "table_type", Some("BASE TABLE"));
        let row = self.set(row, "engine", Some("InnoDB"));
        let row = self.set(row, "table_rows", Some("42"));
        let row = self.set(row, "table_comment", Some(comment));
        self.tables.push(row);
        self
    }

    /// Overwrites one field of an already added table row.
    pub(crate) fn table_field(mut self, table: &str, field: &str, value: Option<&str>) -> Self {
        let key = self.key(field);
        let name = self.key("table_name");
        for row in self.tables.iter_mut().filter(|row| row.get(&name) == Some(table)) {
            row.insert(&key, value.map(str::to_string));
        }
        self
    }

    /// Adds a column; `key` is the raw `COLUMN_KEY` flag (`PRI`, `UNI`, `MUL` or empty).
    pub(crate) fn column(
        mut self,
        table: &str,
        name: &str,
        ordinal: u32,
        nullable: bool,
        key: &str,
    ) -> Self {
        let row = self.row(&self.schema.clone(), table);
        let row = self.set(row, "column_name", Some(name));
        let row = self.set(row, "ordinal_position", Some(ordinal.to_string().as_str()));
        let row = self.set(row, "is_nullable", Some(if nullable { "YES" } else { "NO" }));
        let row = self.set(row, "data_type", Some("bigint"));
        let row = self.set(row, "column_key", Some(key));
        let row = self.set(row, "column_comment", Some(""));
        self.columns.push(row);
        self
    }

    pub(crate) fn foreign_key(
        self,
        constraint: &str,
        table: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) -> Self {
        self.key_usage(constraint, table, column, Some((referenced_table, referenced_column)))
    }

    /// A key usage row with NULL references, like a primary key's.
    pub(crate) fn key_usage(
        mut self,
        constraint: &str,
        table: &str,
        column: &str,
        reference: Option<(&str, &str)>,
    ) -> Self {
        let schema = self.schema.clone();
        let row = self.row(&schema, table);
        let row = self.set(row, "constraint_name", Some(constraint));
        let row = self.set(row, "column_name", Some(column));
        let row = self.set(row, "ordinal_position", Some("1"));
        let row = self.set(
            row,
            "referenced_table_schema",
            reference.map(|_| schema.as_str()),
        );
        let row = self.set(row, "referenced_table_name", reference.map(|(t, _)| t));
        let row = self.set(row, "referenced_column_name", reference.map(|(_, c)| c));
        self.key_usages.push(row);
        self
    }

    /// Queries received so far.
    pub(crate) fn queries(&self) -> Vec<CatalogQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn rows(&self, view: CatalogView) -> &[CatalogRow] {
        match view {
            CatalogView::Tables => &self.tables,
            CatalogView::Columns => &self.columns,
            CatalogView::KeyColumnUsage => &self.key_usages,
        }
    }

    fn value<'r>(&self, row: &'r CatalogRow, field: &str) -> Option<&'r str> {
        row.get(&self.key(field))
    }

    fn run(&self, query: &CatalogQuery) -> Vec<CatalogRow> {
        let mut rows: Vec<CatalogRow> = self
            .rows(query.view)
            .iter()
            .filter(|row| query.predicates.iter().all(|p| self.matches(row, p)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            query
                .order_by
                .iter()
                .map(|field| compare(self.value(a, field), self.value(b, field)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        rows
    }

    fn matches(&self, row: &CatalogRow, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Eq(field, expected) => self.value(row, field) == Some(expected.as_str()),
            Predicate::In(field, values) => self
                .value(row, field)
                .is_some_and(|v| values.iter().any(|x| x == v)),
            Predicate::NotIn(field, values) => self
                .value(row, field)
                .is_some_and(|v| !values.iter().any(|x| x == v)),
            Predicate::InSubquery {
                field,
                select,
                query,
            } => {
                let selected: Vec<String> = self
                    .run(query)
                    .iter()
                    .filter_map(|r| self.value(r, select).map(str::to_string))
                    .collect();
                self.value(row, field)
                    .is_some_and(|v| selected.iter().any(|s| s == v))
            }
            Predicate::NotNull(field) => self.value(row, field).is_some(),
            Predicate::NotBlank(field) => self.value(row, field).is_some_and(|v| !v.is_empty()),
            Predicate::Any(members) => members.iter().any(|p| self.matches(row, p)),
        }
    }
}

fn compare(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a.and_then(|v| v.parse::<u64>().ok()), b.and_then(|v| v.parse::<u64>().ok())) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(&b),
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.run(query))
    }
}

/// A catalog that cannot be reached.
pub(crate) struct Unreachable;

#[async_trait]
impl CatalogSource for Unreachable {
    async fn fetch(&self, _query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        Err(CatalogError::Connection(sqlx::Error::PoolTimedOut))
    }
}

pub(crate) fn reader(catalog: MemoryCatalog) -> (Arc<MemoryCatalog>, CatalogReader<Arc<MemoryCatalog>>) {
    let database = catalog_database(&catalog);
    let dialect = catalog.dialect;
    let catalog = Arc::new(catalog);
    let reader = CatalogReader::new(Arc::clone(&catalog), ReaderConfig::new(dialect, database));
    (catalog, reader)
}

fn catalog_database(catalog: &MemoryCatalog) -> String {
    match catalog.dialect {
        Dialect::MySql => catalog.schema.clone(),
        Dialect::Postgres => catalog.catalog.clone(),
    }
}

/// users, posts, post_tag (junction, no comment), tags, plus housekeeping tables.
pub(crate) fn blog_catalog() -> MemoryCatalog {
    MemoryCatalog::mysql("blog")
        .table("users", "App users")
        .table("posts", "Blog posts")
        .table("post_tag", "")
        .table("tags", "Tags")
        .table("migrations", "")
        .table("failed_jobs", "")
        .table("password_resets", "")
        .column("users", "id", 1, false, "PRI")
        .column("users", "email", 2, false, "UNI")
        .column("posts", "id", 1, false, "PRI")
        .column("posts", "user_id", 2, false, "MUL")
        .column("posts", "title", 3, true, "")
        .column("post_tag", "post_id", 1, false, "MUL")
        .column("post_tag", "tag_id", 2, false, "MUL")
        .column("tags", "id", 1, false, "PRI")
        .column("tags", "name", 2, false, "UNI")
        .key_usage("PRIMARY", "users", "id", None)
        .key_usage("PRIMARY", "posts", "id", None)
        .key_usage("PRIMARY", "tags", "id", None)
        .foreign_key("posts_user_id_foreign", "posts", "user_id", "users", "id")
        .foreign_key("post_tag_post_id_foreign", "post_tag", "post_id", "posts", "id")
        .foreign_key("post_tag_tag_id_foreign", "post_tag", "tag_id", "tags", "id")
}
