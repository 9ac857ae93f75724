use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database connection string.
    #[arg(short, long, env = "DB_URL")]
    pub db_url: Option<String>,

    /// Backend dialect (mysql, postgres). Inferred from the URL scheme when omitted.
    #[arg(long, env = "DB_DIALECT")]
    pub dialect: Option<String>,

    /// Only report this table.
    #[arg(short, long)]
    pub table: Option<String>,

    /// Extra tables to skip, on top of the framework housekeeping tables.
    #[arg(short, long)]
    pub ignore: Option<Vec<String>>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,
}
