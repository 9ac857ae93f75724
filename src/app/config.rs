use crate::app::cli::{Cli, OutputFormat};
use crate::app::dialect::Dialect;
use crate::app::reader::ReaderConfig;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub db_name: String,
    pub dialect: Dialect,
    pub table: Option<String>,
    pub ignore_tables: Vec<String>,
    pub format: OutputFormat,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig::new(self.dialect, &self.db_name).ignore(self.ignore_tables.iter().cloned())
    }
}

/// Builds the runtime config from parsed arguments; clap has already
/// applied the `DB_URL` and `DB_DIALECT` fallbacks.
pub fn resolve_config(cli: Cli) -> Result<AppConfig> {
    let db_url = cli
        .db_url
        .context("DB_URL must be set via --db-url or in .env/environment variables")?;

    let dialect = resolve_dialect(cli.dialect.as_deref(), &db_url)?;

    let db_name = database_name(&db_url)
        .with_context(|| format!("no database name in connection string for {dialect}"))?;

    Ok(AppConfig {
        db_url,
        db_name,
        dialect,
        table: cli.table,
        ignore_tables: cli.ignore.unwrap_or_default(),
        format: cli.format,
        max_connections: cli.max_connections,
    })
}

/// An explicit dialect name wins over the URL scheme.
pub fn resolve_dialect(explicit: Option<&str>, db_url: &str) -> Result<Dialect> {
    let dialect = match explicit {
        Some(name) => name.parse::<Dialect>()?,
        None => Dialect::from_url(db_url)?,
    };
    Ok(dialect)
}

/// The path segment of a connection URL, without query parameters.
fn database_name(db_url: &str) -> Option<String> {
    let (_, rest) = db_url.split_once("://")?;
    let (_, path) = rest.split_once('/')?;
    let name = path.split(['?', '#']).next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}
