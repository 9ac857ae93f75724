/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised while reading or interpreting the information schema.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog could not be queried. Fatal, propagated unchanged.
    #[error("catalog unreachable: {0}")]
    Connection(#[from] sqlx::Error),
    /// A referenced table or column is missing from the catalog.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
    /// Unrecognized backend or incomplete configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// A catalog field held a value of the wrong shape.
    #[error("cannot decode field `{field}` from value `{value}`")]
    Decode { field: &'static str, value: String },
}

impl CatalogError {
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "table",
            name: name.into(),
        }
    }

    pub fn column_not_found(table: &str, column: &str) -> Self {
        Self::NotFound {
            kind: "column",
            name: format!("{table}.{column}"),
        }
    }
}
