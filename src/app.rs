pub mod catalog;
pub mod cli;
pub mod columns;
pub mod config;
pub mod dialect;
pub mod error;
pub mod formatter;
pub mod inspector;
pub mod models;
pub mod naming;
pub mod reader;
pub mod relations;

use anyhow::{Context, Result};
use clap::Parser;

use self::catalog::SqlCatalog;
use self::cli::{Cli, OutputFormat};
use self::config::{AppConfig, resolve_config};
use self::formatter::OutputGenerator;
use self::inspector::Inspector;
use self::reader::CatalogReader;

// Connects, Scans, and Formats in one go.
pub async fn generate_report(config: &AppConfig) -> Result<String> {
    // 1. Connect
    let source = SqlCatalog::connect(&config.db_url, config.dialect, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    let reader = CatalogReader::new(source, config.reader_config());

    // 2. Scan (Inspector)
    let inspector = Inspector::new(&reader, config.table.clone());
    let table_data = inspector.scan().await.context("Failed to read the catalog")?;

    // 3. Format (OutputGenerator)
    let output = match config.format {
        OutputFormat::Markdown => OutputGenerator::generate_markdown(&config.db_name, &table_data)?,
        OutputFormat::Json => OutputGenerator::generate_json(&table_data)?,
    };

    Ok(output)
}

pub async fn run() -> Result<()> {
    // 1. Parse Args (.env feeds the DB_URL / DB_DIALECT fallbacks)
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    // 2. Resolve Config
    let config = resolve_config(args)?;

    // 3. Generate
    let output = generate_report(&config).await?;

    // 4. Output
    print!("{}", output);

    Ok(())
}
