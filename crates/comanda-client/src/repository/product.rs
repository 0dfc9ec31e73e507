//! # Product Repository
//!
//! Products (`product`) of a store.
//!
//! Prices travel as JSON numbers with two decimals; inside the app they are
//! always [`Money`].

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use comanda_core::validation::{validate_name, validate_price};
use comanda_core::{Money, Product};

use super::{catalog_query, list_scope, row_in_store, Decimal};
use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::ClientResult;
use crate::rest::RestClient;

const TABLE: &str = "product";

/// Input for [`ProductRepository::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category_id: Option<String>,
}

/// Fields to change on a product. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
struct ProductInsert<'a> {
    store_id: &'a str,
    name: String,
    price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<&'a str>,
}

#[derive(Serialize)]
struct ProductUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
}

impl ProductPatch {
    fn to_update(&self) -> ClientResult<ProductUpdate<'_>> {
        let name = match &self.name {
            Some(name) => Some(validate_name("name", name)?),
            None => None,
        };
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(ProductUpdate {
            name,
            price: self.price.map(Decimal),
            category_id: self.category_id.as_deref(),
            is_active: self.is_active,
        })
    }
}

/// Repository for the store's products.
///
/// ## Usage
/// ```rust,ignore
/// let products = repos.products(&store.id);
///
/// // What the order screen shows
/// let menu = products.list(false).await?;
///
/// // Price change
/// products.update(&id, &ProductPatch { price: Some(Money::from_cents(2800)), ..Default::default() }).await?;
/// ```
#[derive(Clone)]
pub struct ProductRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
    store_id: String,
}

impl ProductRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>, store_id: &str) -> Self {
        ProductRepository {
            rest,
            cache,
            store_id: store_id.to_string(),
        }
    }

    /// Products by name. Inactive ones only with `show_all`.
    pub async fn list(&self, show_all: bool) -> ClientResult<Vec<Product>> {
        let key = QueryKey::new(Entity::Products, &self.store_id, list_scope(show_all));
        self.cache
            .get_or_fetch(key, || async {
                self.rest
                    .select(TABLE, &catalog_query(&self.store_id, show_all))
                    .await
            })
            .await
    }

    /// Looks a product up in the active list.
    pub async fn find(&self, id: &str) -> ClientResult<Option<Product>> {
        Ok(self.list(false).await?.into_iter().find(|p| p.id == id))
    }

    pub async fn create(&self, input: &NewProduct) -> ClientResult<Product> {
        let name = validate_name("name", &input.name)?;
        validate_price(input.price)?;

        let row = ProductInsert {
            store_id: &self.store_id,
            name,
            price: Decimal(input.price),
            category_id: input.category_id.as_deref(),
        };
        let created: Product = self.rest.insert(TABLE, &row).await?;

        self.cache.invalidate(Entity::Products, &self.store_id);
        info!(
            store_id = %self.store_id,
            product_id = %created.id,
            price = %created.price,
            "Product created"
        );
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: &ProductPatch) -> ClientResult<Product> {
        let update = patch.to_update()?;
        let updated: Product = self
            .rest
            .update(TABLE, &row_in_store(id, &self.store_id), &update)
            .await?;

        self.cache.invalidate(Entity::Products, &self.store_id);
        info!(store_id = %self.store_id, product_id = %id, "Product updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_body() {
        let patch = ProductPatch {
            price: Some(Money::from_cents(2800)),
            is_active: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(patch.to_update().unwrap()).unwrap(),
            json!({ "price": 28.0, "is_active": true })
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        let patch = ProductPatch {
            price: Some(Money::from_cents(-1)),
            ..Default::default()
        };
        assert!(patch.to_update().is_err());
    }

    #[test]
    fn test_insert_body() {
        let row = ProductInsert {
            store_id: "s-1",
            name: "Taco".into(),
            price: Decimal(Money::from_cents(2500)),
            category_id: None,
        };
        assert_eq!(
            serde_json::to_value(row).unwrap(),
            json!({ "store_id": "s-1", "name": "Taco", "price": 25.0 })
        );
    }
}
