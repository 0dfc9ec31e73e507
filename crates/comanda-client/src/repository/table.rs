//! Dining tables (`dining_table`).

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use comanda_core::validation::validate_name;
use comanda_core::DiningTable;

use super::{catalog_query, list_scope, row_in_store};
use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::ClientResult;
use crate::rest::RestClient;

const TABLE: &str = "dining_table";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TablePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct TableRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
    store_id: String,
}

impl TableRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>, store_id: &str) -> Self {
        TableRepository {
            rest,
            cache,
            store_id: store_id.to_string(),
        }
    }

    pub async fn list(&self, show_all: bool) -> ClientResult<Vec<DiningTable>> {
        let key = QueryKey::new(Entity::Tables, &self.store_id, list_scope(show_all));
        self.cache
            .get_or_fetch(key, || async {
                self.rest
                    .select(TABLE, &catalog_query(&self.store_id, show_all))
                    .await
            })
            .await
    }

    /// Looks a table up in the active list.
    pub async fn find(&self, id: &str) -> ClientResult<Option<DiningTable>> {
        Ok(self.list(false).await?.into_iter().find(|t| t.id == id))
    }

    pub async fn create(&self, name: &str) -> ClientResult<DiningTable> {
        let name = validate_name("name", name)?;
        let created: DiningTable = self
            .rest
            .insert(TABLE, &json!({ "name": name, "store_id": self.store_id }))
            .await?;

        self.cache.invalidate(Entity::Tables, &self.store_id);
        info!(store_id = %self.store_id, table_id = %created.id, "Table created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: &TablePatch) -> ClientResult<DiningTable> {
        let mut patch = patch.clone();
        if let Some(name) = &patch.name {
            patch.name = Some(validate_name("name", name)?);
        }

        let updated: DiningTable = self
            .rest
            .update(TABLE, &row_in_store(id, &self.store_id), &patch)
            .await?;

        self.cache.invalidate(Entity::Tables, &self.store_id);
        info!(store_id = %self.store_id, table_id = %id, "Table updated");
        Ok(updated)
    }
}
