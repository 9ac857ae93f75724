pub mod app;

// Re-export useful types for library users
pub use app::catalog::{CatalogQuery, CatalogRow, CatalogSource, CatalogView, Predicate, SqlCatalog};
pub use app::columns::ColumnResolver;
pub use app::config::AppConfig;
pub use app::dialect::Dialect;
pub use app::error::CatalogError;
pub use app::formatter::OutputGenerator;
pub use app::generate_report;
pub use app::inspector::Inspector;
pub use app::models::{
    BelongsTo, BelongsToMany, CatalogSnapshot, ColumnInfo, ForeignKeyEdge, HasMany, KeyRole,
    RelationshipSet, TableData, TableInfo,
};
pub use app::naming::ArtifactNames;
pub use app::reader::{CatalogReader, ForeignKeyFilter, ReaderConfig, TableFilter};
pub use app::relations::RelationshipInferencer;
