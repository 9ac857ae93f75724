use std::fmt;
use std::str::FromStr;

use crate::app::catalog::CatalogView;
use crate::app::error::CatalogError;

/// Backend-specific rules for addressing the information schema.
///
/// Chosen once when configuration is resolved; everything downstream of the
/// catalog reader works with canonical lower-case field names and never
/// branches on the backend again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
}

impl Dialect {
    /// Infers the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self, CatalogError> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme).ok_or_else(|| {
            CatalogError::Configuration(format!("cannot read a scheme from `{url}`"))
        })?;
        scheme.parse()
    }

    /// The `(catalog, schema)` pair identifying `database` in this backend.
    pub fn catalog_identity(&self, database: &str) -> (String, String) {
        match self {
            Self::MySql => ("def".to_string(), database.to_string()),
            Self::Postgres => (database.to_string(), "public".to_string()),
        }
    }

    /// Maps a field name as reported by the server to its canonical form.
    pub fn normalize_field_name(&self, name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Renders a canonical field name in the casing the backend reports.
    pub fn identifier(&self, field: &str) -> String {
        match self {
            Self::MySql => field.to_ascii_uppercase(),
            Self::Postgres => field.to_ascii_lowercase(),
        }
    }

    /// Bind placeholder for the `n`th (1-based) parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::MySql => "?".to_string(),
            Self::Postgres => format!("${n}"),
        }
    }

    /// Wraps an expression so the server hands it back as text.
    pub fn text_cast(&self, expr: &str) -> String {
        match self {
            Self::MySql => format!("CAST({expr} AS CHAR)"),
            Self::Postgres => format!("CAST({expr} AS TEXT)"),
        }
    }

    /// The `FROM` source for a catalog view.
    pub fn view_source(&self, view: CatalogView) -> String {
        match (self, view) {
            (Self::MySql, CatalogView::Tables) => "information_schema.TABLES".to_string(),
            (Self::MySql, CatalogView::Columns) => "information_schema.COLUMNS".to_string(),
            (Self::MySql, CatalogView::KeyColumnUsage) => {
                "information_schema.KEY_COLUMN_USAGE".to_string()
            }
            (Self::Postgres, view) => {
                format!("({}) AS {}", postgres_view_body(view), view.name())
            }
        }
    }
}

impl FromStr for Dialect {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(CatalogError::Configuration(format!(
                "unsupported database dialect `{other}`"
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MySql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

// PostgreSQL's information_schema has no comments, key roles or referenced
// columns; these derived tables expose the same fields MySQL reports.
fn postgres_view_body(view: CatalogView) -> String {
    match view {
        CatalogView::Tables => r#"
            SELECT t.table_catalog, t.table_schema, t.table_name, t.table_type,
                   NULL AS engine,
                   CASE WHEN c.reltuples < 0 THEN NULL
                        ELSE CAST(c.reltuples AS BIGINT) END AS table_rows,
                   NULL AS avg_row_length,
                   pg_catalog.pg_relation_size(c.oid) AS data_length,
                   pg_catalog.pg_indexes_size(c.oid) AS index_length,
                   NULL AS auto_increment,
                   NULL AS create_time,
                   NULL AS update_time,
                   NULL AS table_collation,
                   COALESCE(pg_catalog.obj_description(c.oid, 'pg_class'), '') AS table_comment
            FROM information_schema.tables t
            LEFT JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
            LEFT JOIN pg_catalog.pg_class c
              ON c.relname = t.table_name AND c.relnamespace = n.oid
            "#
        .to_string(),
        CatalogView::Columns => format!(
            r#"
            SELECT c.table_catalog, c.table_schema, c.table_name, c.column_name,
                   c.ordinal_position, c.column_default, c.is_nullable, c.data_type,
                   c.character_maximum_length, c.numeric_precision, c.numeric_scale,
                   c.udt_name AS column_type,
                   CASE WHEN {pri} THEN 'PRI' WHEN {uni} THEN 'UNI' WHEN {mul} THEN 'MUL'
                        ELSE '' END AS column_key,
                   COALESCE((
                       SELECT pg_catalog.col_description(a.attrelid, a.attnum)
                       FROM pg_catalog.pg_attribute a
                       JOIN pg_catalog.pg_class ac ON ac.oid = a.attrelid
                       JOIN pg_catalog.pg_namespace an ON an.oid = ac.relnamespace
                       WHERE an.nspname = c.table_schema
                         AND ac.relname = c.table_name
                         AND a.attname = c.column_name
                   ), '') AS column_comment
            FROM information_schema.columns c
            "#,
            pri = constraint_exists("PRIMARY KEY"),
            uni = constraint_exists("UNIQUE"),
            mul = constraint_exists("FOREIGN KEY"),
        ),
        CatalogView::KeyColumnUsage => r#"
            SELECT k.constraint_catalog, k.constraint_schema, k.constraint_name,
                   k.table_catalog, k.table_schema, k.table_name, k.column_name,
                   k.ordinal_position, k.position_in_unique_constraint,
                   r.table_schema AS referenced_table_schema,
                   r.table_name AS referenced_table_name,
                   r.column_name AS referenced_column_name
            FROM information_schema.key_column_usage k
            LEFT JOIN information_schema.referential_constraints rc
              ON rc.constraint_schema = k.constraint_schema
             AND rc.constraint_name = k.constraint_name
            LEFT JOIN information_schema.key_column_usage r
              ON r.constraint_schema = rc.unique_constraint_schema
             AND r.constraint_name = rc.unique_constraint_name
             AND r.ordinal_position = k.position_in_unique_constraint
            "#
        .to_string(),
    }
}

fn constraint_exists(constraint_type: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kc \
           ON kc.constraint_schema = tc.constraint_schema \
          AND kc.constraint_name = tc.constraint_name \
         WHERE tc.constraint_type = '{constraint_type}' \
           AND kc.table_schema = c.table_schema \
           AND kc.table_name = c.table_name \
           AND kc.column_name = c.column_name)"
    )
}
