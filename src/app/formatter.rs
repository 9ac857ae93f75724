use std::fmt::Write;

use crate::app::models::TableData;

pub struct OutputGenerator;

impl OutputGenerator {
    pub fn generate_markdown(
        db_name: &str,
        tables: &[TableData],
    ) -> Result<String, std::fmt::Error> {
        let mut output = String::new();

        writeln!(output, "Database Schema for: {}\n", db_name)?;

        for table in tables {
            writeln!(output, "## Table: {}", table.info.name)?;
            if table.info.has_comment() {
                writeln!(output, "\n> {}\n", table.info.comment)?;
            }

            writeln!(output, "| Column | Type | Nullable | Key | Comment |")?;
            writeln!(output, "|---|---|---|---|---|")?;
            for col in &table.columns {
                writeln!(
                    output,
                    "| {} | {} | {} | {:?} | {} |",
                    col.name,
                    col.column_type.as_deref().unwrap_or(&col.data_type),
                    if col.nullable { "YES" } else { "NO" },
                    col.key,
                    col.comment
                )?;
            }

            if !table.primary_key.is_empty() {
                writeln!(output, "\n**Primary Key:** {}", table.primary_key.join(", "))?;
            }

            if !table.foreign_keys.is_empty() {
                writeln!(output, "\n**Foreign Keys:**")?;
                for fk in &table.foreign_keys {
                    if let Some((other_table, other_column)) = fk.target() {
                        writeln!(
                            output,
                            "- `{}.{}` -> `{}.{}`",
                            table.info.name, fk.column_name, other_table, other_column
                        )?;
                    }
                }
            }

            let relations = &table.relationships;
            if !relations.belongs_to.is_empty() {
                writeln!(output, "\n**Belongs To:**")?;
                for rel in &relations.belongs_to {
                    writeln!(
                        output,
                        "- `{}` -> `{}` via `{}`{}",
                        rel.relation_name,
                        rel.related_table,
                        rel.own_column,
                        if rel.nullable { " (nullable)" } else { "" }
                    )?;
                }
            }
            if !relations.has_many.is_empty() {
                writeln!(output, "\n**Has Many:**")?;
                for rel in &relations.has_many {
                    writeln!(
                        output,
                        "- `{}` via `{}.{}`",
                        rel.relation_name, rel.other_table, rel.other_column
                    )?;
                }
            }
            if !relations.belongs_to_many.is_empty() {
                writeln!(output, "\n**Belongs To Many:**")?;
                for rel in &relations.belongs_to_many {
                    writeln!(
                        output,
                        "- `{}` through `{}` (`{}`, `{}`)",
                        rel.related_table, rel.relation_table, rel.own_column, rel.other_column
                    )?;
                }
            }

            let names = &table.names;
            writeln!(
                output,
                "\n**Names:** model `{}`, controller `{}`, request `{}`, policy `{}`, composer `{}`",
                names.model, names.controller, names.request, names.policy, names.view_composer
            )?;

            writeln!(output, "\n---\n")?;
        }

        Ok(output)
    }

    pub fn generate_json(tables: &[TableData]) -> serde_json::Result<String> {
        serde_json::to_string_pretty(tables)
    }
}
