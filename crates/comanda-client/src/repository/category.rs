//! Product categories (`product_category`).

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use comanda_core::validation::validate_name;
use comanda_core::Category;

use super::{catalog_query, list_scope, row_in_store};
use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::ClientResult;
use crate::rest::RestClient;

const TABLE: &str = "product_category";

/// Fields to change on a category. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    /// Trims and checks the name, if one is being set.
    fn validated(&self) -> ClientResult<Self> {
        let name = match &self.name {
            Some(name) => Some(validate_name("name", name)?),
            None => None,
        };
        Ok(CategoryPatch {
            name,
            is_active: self.is_active,
        })
    }
}

#[derive(Clone)]
pub struct CategoryRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
    store_id: String,
}

impl CategoryRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>, store_id: &str) -> Self {
        CategoryRepository {
            rest,
            cache,
            store_id: store_id.to_string(),
        }
    }

    /// Categories by name. Inactive ones only with `show_all`.
    pub async fn list(&self, show_all: bool) -> ClientResult<Vec<Category>> {
        let key = QueryKey::new(Entity::Categories, &self.store_id, list_scope(show_all));
        self.cache
            .get_or_fetch(key, || async {
                self.rest
                    .select(TABLE, &catalog_query(&self.store_id, show_all))
                    .await
            })
            .await
    }

    pub async fn create(&self, name: &str) -> ClientResult<Category> {
        let name = validate_name("name", name)?;
        let created: Category = self
            .rest
            .insert(TABLE, &json!({ "name": name, "store_id": self.store_id }))
            .await?;

        self.cache.invalidate(Entity::Categories, &self.store_id);
        info!(store_id = %self.store_id, category_id = %created.id, "Category created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: &CategoryPatch) -> ClientResult<Category> {
        let patch = patch.validated()?;
        let updated: Category = self
            .rest
            .update(TABLE, &row_in_store(id, &self.store_id), &patch)
            .await?;

        self.cache.invalidate(Entity::Categories, &self.store_id);
        info!(store_id = %self.store_id, category_id = %id, "Category updated");
        Ok(updated)
    }
}
