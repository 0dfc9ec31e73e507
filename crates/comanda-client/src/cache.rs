//! # Query Cache
//!
//! Short-lived cache of list queries, keyed by entity and store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.list(false)                                                   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  QueryKey { Products, "s-1", "active" } ── fresh? ──► cached value      │
//! │     │                                     (age < stale_after)           │
//! │     └── missing / stale ──► fetch ──► store ──► value                   │
//! │                                                                         │
//! │  products.update(..) succeeds ──► invalidate(Products, "s-1")           │
//! │                                   drops every scope of that pair        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failed fetches are not cached and are never retried here.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::ClientResult;

/// What a cached query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Categories,
    Products,
    Tables,
    Orders,
    Summary,
    Members,
    Store,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Categories => "categories",
            Entity::Products => "products",
            Entity::Tables => "tables",
            Entity::Orders => "orders",
            Entity::Summary => "summary",
            Entity::Members => "members",
            Entity::Store => "store",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub entity: Entity,
    pub store_id: String,
    /// Distinguishes variants of the same query (`all`, `active`, a date).
    pub scope: String,
}

impl QueryKey {
    pub fn new(entity: Entity, store_id: &str, scope: impl Into<String>) -> Self {
        QueryKey {
            entity,
            store_id: store_id.to_string(),
            scope: scope.into(),
        }
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    stale_after: Duration,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        QueryCache {
            entries: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    /// Fresh cached value, if any.
    pub fn get<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.stale_after {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    pub fn put<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.lock().insert(
            key,
            Entry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
            },
        );
    }

    /// Cached value when fresh, otherwise runs `fetch` and caches its result.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            debug!(entity = key.entity.as_str(), store_id = %key.store_id, "Cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.put(key, value.clone());
        Ok(value)
    }

    /// Drops every cached query of `entity` for `store_id`.
    pub fn invalidate(&self, entity: Entity, store_id: &str) {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !(key.entity == entity && key.store_id == store_id));
        debug!(
            entity = entity.as_str(),
            store_id,
            dropped = before - entries.len(),
            "Cache invalidated"
        );
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
