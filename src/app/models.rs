use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::app::catalog::{CatalogRow, field};
use crate::app::error::{CatalogError, Result};
use crate::app::naming::ArtifactNames;

/// A row of `information_schema.tables`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub table_type: Option<String>,
    pub engine: Option<String>,
    pub comment: String,
    pub row_count: Option<u64>,
    pub avg_row_length: Option<u64>,
    pub data_length: Option<u64>,
    pub index_length: Option<u64>,
    pub auto_increment: Option<u64>,
    pub collation: Option<String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl TableInfo {
    /// A minimal table, for callers that only know a name and comment.
    pub fn new(schema_name: &str, name: &str, comment: &str) -> Self {
        Self {
            catalog_name: String::new(),
            schema_name: schema_name.to_string(),
            name: name.to_string(),
            table_type: None,
            engine: None,
            comment: comment.to_string(),
            row_count: None,
            avg_row_length: None,
            data_length: None,
            index_length: None,
            auto_increment: None,
            collation: None,
            create_time: None,
            update_time: None,
        }
    }

    /// Commented tables are first-class domain entities.
    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    pub fn names(&self) -> ArtifactNames {
        ArtifactNames::for_table(&self.name)
    }
}

impl TryFrom<&CatalogRow> for TableInfo {
    type Error = CatalogError;

    fn try_from(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            catalog_name: text(row, field::TABLE_CATALOG),
            schema_name: text(row, field::TABLE_SCHEMA),
            name: text(row, field::TABLE_NAME),
            table_type: optional_text(row, field::TABLE_TYPE),
            engine: optional_text(row, field::ENGINE),
            comment: text(row, field::TABLE_COMMENT),
            row_count: statistic(row, field::TABLE_ROWS),
            avg_row_length: statistic(row, field::AVG_ROW_LENGTH),
            data_length: statistic(row, field::DATA_LENGTH),
            index_length: statistic(row, field::INDEX_LENGTH),
            auto_increment: statistic(row, field::AUTO_INCREMENT),
            collation: optional_text(row, field::TABLE_COLLATION),
            create_time: optional_text(row, field::CREATE_TIME),
            update_time: optional_text(row, field::UPDATE_TIME),
        })
    }
}

/// The part a column plays in the table's keys.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    Foreign,
}

impl FromStr for KeyRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Foreign,
            _ => Self::None,
        })
    }
}

/// A row of `information_schema.columns`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub table_schema: String,
    pub table_name: String,
    pub name: String,
    pub ordinal_position: u32,
    pub nullable: bool,
    pub data_type: String,
    pub column_type: Option<String>,
    pub character_maximum_length: Option<u64>,
    pub numeric_precision: Option<u64>,
    pub numeric_scale: Option<u64>,
    pub key: KeyRole,
    pub default: Option<String>,
    pub comment: String,
}

impl TryFrom<&CatalogRow> for ColumnInfo {
    type Error = CatalogError;

    fn try_from(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            table_schema: text(row, field::TABLE_SCHEMA),
            table_name: text(row, field::TABLE_NAME),
            name: text(row, field::COLUMN_NAME),
            ordinal_position: ordinal(row)?,
            nullable: row
                .get(field::IS_NULLABLE)
                .is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            data_type: text(row, field::DATA_TYPE),
            column_type: optional_text(row, field::COLUMN_TYPE),
            character_maximum_length: number(row, field::CHARACTER_MAXIMUM_LENGTH)?,
            numeric_precision: number(row, field::NUMERIC_PRECISION)?,
            numeric_scale: number(row, field::NUMERIC_SCALE)?,
            key: row
                .get(field::COLUMN_KEY)
                .unwrap_or_default()
                .parse()
                .unwrap_or_default(),
            default: optional_text(row, field::COLUMN_DEFAULT),
            comment: text(row, field::COLUMN_COMMENT),
        })
    }
}

/// One column pair of a foreign key: an edge of the schema's key graph.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyEdge {
    pub constraint_name: String,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: u32,
    pub referenced_table_schema: Option<String>,
    pub referenced_table_name: Option<String>,
    pub referenced_column_name: Option<String>,
}

impl ForeignKeyEdge {
    /// The referenced `(table, column)`, unless either side is blank.
    pub fn target(&self) -> Option<(&str, &str)> {
        let table = self.referenced_table_name.as_deref().filter(|t| !t.is_empty())?;
        let column = self.referenced_column_name.as_deref().filter(|c| !c.is_empty())?;
        Some((table, column))
    }

    pub fn references(&self, table: &str) -> bool {
        self.target().is_some_and(|(t, _)| t == table)
    }
}

impl TryFrom<&CatalogRow> for ForeignKeyEdge {
    type Error = CatalogError;

    fn try_from(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            constraint_name: text(row, field::CONSTRAINT_NAME),
            table_schema: text(row, field::TABLE_SCHEMA),
            table_name: text(row, field::TABLE_NAME),
            column_name: text(row, field::COLUMN_NAME),
            ordinal_position: ordinal(row)?,
            referenced_table_schema: optional_text(row, field::REFERENCED_TABLE_SCHEMA),
            referenced_table_name: optional_text(row, field::REFERENCED_TABLE_NAME),
            referenced_column_name: optional_text(row, field::REFERENCED_COLUMN_NAME),
        })
    }
}

/// `table` holds a foreign key to a parent.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BelongsTo {
    pub relation_name: String,
    pub related_table: String,
    /// `None` when the referenced table is missing from the catalog.
    pub related_model: Option<String>,
    pub related_comment: Option<String>,
    pub own_column: String,
    pub other_table: String,
    pub other_column: String,
    pub nullable: bool,
}

/// A child table holds a foreign key to `table`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HasMany {
    pub relation_name: String,
    pub related_table: String,
    pub related_model: Option<String>,
    pub related_comment: Option<String>,
    pub own_column: String,
    pub other_table: String,
    pub other_column: String,
}

/// `table` reaches `related_table` through the junction `relation_table`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BelongsToMany {
    pub relation_name: String,
    pub relation_table: String,
    pub related_table: String,
    pub related_model: Option<String>,
    pub related_comment: Option<String>,
    /// Junction column pointing back at `table`.
    pub own_column: String,
    /// Junction column pointing at `related_table`.
    pub other_column: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSet {
    pub belongs_to: Vec<BelongsTo>,
    pub has_many: Vec<HasMany>,
    pub belongs_to_many: Vec<BelongsToMany>,
}

/// The catalog rows a relationship computation needs, read in one pass.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub tables: Vec<TableInfo>,
    pub columns: Vec<ColumnInfo>,
    pub edges: Vec<ForeignKeyEdge>,
}

impl CatalogSnapshot {
    pub fn table(&self, name: &str) -> Result<&TableInfo> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CatalogError::table_not_found(name))
    }

    pub fn column(&self, table: &str, column: &str) -> Result<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.table_name == table && c.name == column)
            .ok_or_else(|| CatalogError::column_not_found(table, column))
    }
}

// Separating the "Scanning" phase from the "Formatting" phase.
#[derive(Serialize, Debug, Clone)]
pub struct TableData {
    pub info: TableInfo,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyEdge>,
    pub relationships: RelationshipSet,
    pub names: ArtifactNames,
}

fn text(row: &CatalogRow, field: &str) -> String {
    row.get(field).unwrap_or_default().to_string()
}

fn optional_text(row: &CatalogRow, field: &str) -> Option<String> {
    row.get(field).map(str::to_string)
}

fn number(row: &CatalogRow, field: &'static str) -> Result<Option<u64>> {
    row.get(field)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| CatalogError::Decode {
                field,
                value: value.to_string(),
            })
        })
        .transpose()
}

fn ordinal(row: &CatalogRow) -> Result<u32> {
    let position = number(row, field::ORDINAL_POSITION)?.unwrap_or_default();
    u32::try_from(position).map_err(|_| CatalogError::Decode {
        field: field::ORDINAL_POSITION,
        value: position.to_string(),
    })
}

/// Storage statistics are estimates; negative or unreadable values become `None`.
fn statistic(row: &CatalogRow, field: &'static str) -> Option<u64> {
    let value = row.get(field)?;
    let parsed = value.trim().parse::<u64>().ok();
    if parsed.is_none() {
        debug!(field, value, "ignoring storage statistic");
    }
    parsed
}
