use tracing::info;

use crate::app::catalog::CatalogSource;
use crate::app::columns::primary_key;
use crate::app::error::Result;
use crate::app::models::TableData;
use crate::app::reader::{CatalogReader, TableFilter};
use crate::app::relations::RelationshipInferencer;

// Walks every visible table and gathers what the report needs.

pub struct Inspector<'a, S> {
    reader: &'a CatalogReader<S>,
    only_table: Option<String>,
}

impl<'a, S: CatalogSource> Inspector<'a, S> {
    pub fn new(reader: &'a CatalogReader<S>, only_table: Option<String>) -> Self {
        Self { reader, only_table }
    }

    pub async fn scan(&self) -> Result<Vec<TableData>> {
        let tables = match &self.only_table {
            Some(name) => vec![self.reader.table(name).await?],
            None => self.reader.list_tables(&TableFilter::default()).await?,
        };
        info!(tables = tables.len(), "scanning schema");

        let inferencer = RelationshipInferencer::new(self.reader);
        let mut results = Vec::new();

        for info in tables {
            let columns = self.reader.list_columns(&info.name).await?;
            let primary_key = primary_key(&columns).into_iter().map(|c| c.name).collect();
            let foreign_keys = self.reader.foreign_keys_of(&info.name).await?;
            let relationships = inferencer.relationships_of(&info).await?;

            results.push(TableData {
                names: info.names(),
                info,
                columns,
                primary_key,
                foreign_keys,
                relationships,
            });
        }

        Ok(results)
    }
}
