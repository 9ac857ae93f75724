use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Column, Row};
use tracing::debug;

use crate::app::dialect::Dialect;
use crate::app::error::{CatalogError, Result};

/// Canonical (lower-case) catalog field names.
pub mod field {
    pub const TABLE_CATALOG: &str = "table_catalog";
    pub const TABLE_SCHEMA: &str = "table_schema";
    pub const TABLE_NAME: &str = "table_name";
    pub const TABLE_TYPE: &str = "table_type";
    pub const ENGINE: &str = "engine";
    pub const TABLE_ROWS: &str = "table_rows";
    pub const AVG_ROW_LENGTH: &str = "avg_row_length";
    pub const DATA_LENGTH: &str = "data_length";
    pub const INDEX_LENGTH: &str = "index_length";
    pub const AUTO_INCREMENT: &str = "auto_increment";
    pub const CREATE_TIME: &str = "create_time";
    pub const UPDATE_TIME: &str = "update_time";
    pub const TABLE_COLLATION: &str = "table_collation";
    pub const TABLE_COMMENT: &str = "table_comment";

    pub const COLUMN_NAME: &str = "column_name";
    pub const ORDINAL_POSITION: &str = "ordinal_position";
    pub const COLUMN_DEFAULT: &str = "column_default";
    pub const IS_NULLABLE: &str = "is_nullable";
    pub const DATA_TYPE: &str = "data_type";
    pub const CHARACTER_MAXIMUM_LENGTH: &str = "character_maximum_length";
    pub const NUMERIC_PRECISION: &str = "numeric_precision";
    pub const NUMERIC_SCALE: &str = "numeric_scale";
    pub const COLUMN_TYPE: &str = "column_type";
    pub const COLUMN_KEY: &str = "column_key";
    pub const COLUMN_COMMENT: &str = "column_comment";

    pub const CONSTRAINT_NAME: &str = "constraint_name";
    pub const REFERENCED_TABLE_SCHEMA: &str = "referenced_table_schema";
    pub const REFERENCED_TABLE_NAME: &str = "referenced_table_name";
    pub const REFERENCED_COLUMN_NAME: &str = "referenced_column_name";
}

/// The three information_schema views this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogView {
    Tables,
    Columns,
    KeyColumnUsage,
}

impl CatalogView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::KeyColumnUsage => "key_column_usage",
        }
    }

    /// Fields projected when reading rows of this view.
    pub fn fields(&self) -> &'static [&'static str] {
        use field::*;
        match self {
            Self::Tables => &[
                TABLE_CATALOG,
                TABLE_SCHEMA,
                TABLE_NAME,
                TABLE_TYPE,
                ENGINE,
                TABLE_ROWS,
                AVG_ROW_LENGTH,
                DATA_LENGTH,
                INDEX_LENGTH,
                AUTO_INCREMENT,
                CREATE_TIME,
                UPDATE_TIME,
                TABLE_COLLATION,
                TABLE_COMMENT,
            ],
            Self::Columns => &[
                TABLE_CATALOG,
                TABLE_SCHEMA,
                TABLE_NAME,
                COLUMN_NAME,
                ORDINAL_POSITION,
                COLUMN_DEFAULT,
                IS_NULLABLE,
                DATA_TYPE,
                CHARACTER_MAXIMUM_LENGTH,
                NUMERIC_PRECISION,
                NUMERIC_SCALE,
                COLUMN_TYPE,
                COLUMN_KEY,
                COLUMN_COMMENT,
            ],
            Self::KeyColumnUsage => &[
                CONSTRAINT_NAME,
                TABLE_SCHEMA,
                TABLE_NAME,
                COLUMN_NAME,
                ORDINAL_POSITION,
                REFERENCED_TABLE_SCHEMA,
                REFERENCED_TABLE_NAME,
                REFERENCED_COLUMN_NAME,
            ],
        }
    }
}

/// A filter on catalog rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(&'static str, String),
    In(&'static str, Vec<String>),
    NotIn(&'static str, Vec<String>),
    /// `field IN (SELECT select FROM query.view WHERE ...)`
    InSubquery {
        field: &'static str,
        select: &'static str,
        query: Box<CatalogQuery>,
    },
    NotNull(&'static str),
    /// Non-null and not the empty string.
    NotBlank(&'static str),
    /// Satisfied when any member is.
    Any(Vec<Predicate>),
}

/// A filtered read of one catalog view.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub view: CatalogView,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<&'static str>,
}

impl CatalogQuery {
    pub fn new(view: CatalogView) -> Self {
        Self {
            view,
            predicates: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, field: &'static str) -> Self {
        self.order_by.push(field);
        self
    }

    /// Renders the query as SQL plus its positional bind values.
    pub fn render(&self, dialect: Dialect) -> (String, Vec<String>) {
        let mut binds = Vec::new();
        let projection = self
            .view
            .fields()
            .iter()
            .map(|field| {
                let ident = dialect.identifier(field);
                format!("{} AS {ident}", dialect.text_cast(&ident))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = self.render_select(dialect, &projection, &mut binds);
        (sql, binds)
    }

    fn render_select(&self, dialect: Dialect, projection: &str, binds: &mut Vec<String>) -> String {
        let mut sql = format!("SELECT {projection} FROM {}", dialect.view_source(self.view));
        if !self.predicates.is_empty() {
            let conditions = self
                .predicates
                .iter()
                .map(|p| render_predicate(p, dialect, binds))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        if !self.order_by.is_empty() {
            // Qualified, so the text-cast aliases don't shadow the raw values.
            let view = dialect.identifier(self.view.name());
            let order = self
                .order_by
                .iter()
                .map(|field| format!("{view}.{}", dialect.identifier(field)))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        sql
    }
}

fn render_predicate(predicate: &Predicate, dialect: Dialect, binds: &mut Vec<String>) -> String {
    let bind = |value: &str, binds: &mut Vec<String>| {
        binds.push(value.to_string());
        dialect.placeholder(binds.len())
    };
    match predicate {
        Predicate::Eq(field, value) => {
            format!("{} = {}", dialect.identifier(field), bind(value.as_str(), binds))
        }
        Predicate::In(_, values) if values.is_empty() => "1 = 0".to_string(),
        Predicate::NotIn(_, values) if values.is_empty() => "1 = 1".to_string(),
        Predicate::In(field, values) | Predicate::NotIn(field, values) => {
            let list = values
                .iter()
                .map(|v| bind(v.as_str(), binds))
                .collect::<Vec<_>>()
                .join(", ");
            let op = if matches!(predicate, Predicate::In(..)) {
                "IN"
            } else {
                "NOT IN"
            };
            format!("{} {op} ({list})", dialect.identifier(field))
        }
        Predicate::InSubquery {
            field,
            select,
            query,
        } => {
            let inner = query.render_select(dialect, &dialect.identifier(select), binds);
            format!("{} IN ({inner})", dialect.identifier(field))
        }
        Predicate::NotNull(field) => format!("{} IS NOT NULL", dialect.identifier(field)),
        Predicate::NotBlank(field) => {
            let ident = dialect.identifier(field);
            format!("({ident} IS NOT NULL AND {ident} <> '')")
        }
        Predicate::Any(members) if members.is_empty() => "1 = 0".to_string(),
        Predicate::Any(members) => {
            let alternatives = members
                .iter()
                .map(|p| render_predicate(p, dialect, binds))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("({alternatives})")
        }
    }
}

/// One catalog row: field name to optional text value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow(BTreeMap<String, Option<String>>);

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: Option<&str>) -> Self {
        self.insert(field, value.map(str::to_string));
        self
    }

    pub fn insert(&mut self, field: &str, value: Option<String>) {
        self.0.insert(field.to_string(), value);
    }

    /// The field's value, `None` when absent or SQL NULL.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|v| v.as_deref())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl FromIterator<(String, Option<String>)> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Anything able to answer catalog queries.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>> {
        (**self).fetch(query).await
    }
}

/// A catalog source backed by a live MySQL or PostgreSQL connection pool.
pub struct SqlCatalog {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlCatalog {
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self { pool, dialect }
    }

    pub async fn connect(url: &str, dialect: Dialect, max_connections: u32) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool, dialect))
    }
}

#[async_trait]
impl CatalogSource for SqlCatalog {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>> {
        let (sql, binds) = query.render(self.dialect);
        debug!(view = query.view.name(), binds = binds.len(), "querying catalog");

        let mut statement = sqlx::query(&sql);
        for value in binds {
            statement = statement.bind(value);
        }
        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(|row| decode_row(row, query.view)).collect()
    }
}

fn decode_row(row: &AnyRow, view: CatalogView) -> Result<CatalogRow> {
    row.columns()
        .iter()
        .map(|column| -> Result<(String, Option<String>)> {
            let value = row
                .try_get::<Option<String>, _>(column.ordinal())
                .map_err(|err| decode_error(view, column.name(), err))?;
            Ok((column.name().to_string(), value))
        })
        .collect()
}

// Driver decode failures surface as `Decode`, never `Connection`.
fn decode_error(view: CatalogView, column: &str, err: sqlx::Error) -> CatalogError {
    let field = view
        .fields()
        .iter()
        .copied()
        .find(|field| field.eq_ignore_ascii_case(column))
        .unwrap_or("unknown");
    CatalogError::Decode {
        field,
        value: err.to_string(),
    }
}
