//! The user's store and its printer settings (`store`, `store_member`).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use comanda_core::{Store, StoreConfig};

use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::{ClientError, ClientResult};
use crate::rest::{Query, RestClient};

const STORE_TABLE: &str = "store";
const MEMBER_TABLE: &str = "store_member";

#[derive(Deserialize)]
struct MembershipRow {
    #[serde(default)]
    store: Option<Store>,
}

#[derive(Serialize)]
struct PrinterUpdate<'a> {
    printer_name: Option<&'a str>,
    printer_address: Option<&'a str>,
}

#[derive(Clone)]
pub struct StoreRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
}

impl StoreRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>) -> Self {
        StoreRepository { rest, cache }
    }

    /// Store of the user's first active membership, if any.
    pub async fn current_store(&self, user_id: &str) -> ClientResult<Option<Store>> {
        let query = Query::new()
            .select("store(id,name)")
            .eq("user_id", user_id)
            .eq("is_active", true);

        let rows: Vec<MembershipRow> = self.rest.select(MEMBER_TABLE, &query).await?;
        if rows.len() > 1 {
            warn!(user_id, memberships = rows.len(), "User belongs to several stores, using the first");
        }
        Ok(rows.into_iter().find_map(|row| row.store))
    }

    pub async fn get_config(&self, store_id: &str) -> ClientResult<StoreConfig> {
        let key = QueryKey::new(Entity::Store, store_id, "config");
        self.cache
            .get_or_fetch(key, || async {
                let query = Query::new()
                    .select("id,name,printer_name,printer_address")
                    .eq("id", store_id);
                self.rest
                    .select_one(STORE_TABLE, &query)
                    .await?
                    .ok_or_else(|| ClientError::NotFound {
                        entity: "store".to_string(),
                        id: store_id.to_string(),
                    })
            })
            .await
    }

    /// Sets (or with `None`, clears) the store's printer.
    pub async fn update_printer(
        &self,
        store_id: &str,
        name: Option<&str>,
        address: Option<&str>,
    ) -> ClientResult<StoreConfig> {
        let query = Query::new()
            .select("id,name,printer_name,printer_address")
            .eq("id", store_id);
        let body = PrinterUpdate {
            printer_name: name.map(str::trim).filter(|n| !n.is_empty()),
            printer_address: address.map(str::trim).filter(|a| !a.is_empty()),
        };

        let updated: StoreConfig = self.rest.update(STORE_TABLE, &query, &body).await?;

        self.cache.invalidate(Entity::Store, store_id);
        info!(
            store_id,
            printer = ?updated.printer_name,
            address = ?updated.printer_address,
            "Store printer updated"
        );
        Ok(updated)
    }
}
