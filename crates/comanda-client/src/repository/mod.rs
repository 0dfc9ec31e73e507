//! # Repository Module
//!
//! Typed bindings over the backend's tables and procedures.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal command                                                       │
//! │       │                                                                 │
//! │       │  repos.products("s-1").list(false)                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── list(show_all)      ──► QueryCache ──► GET  /rest/v1/product       │
//! │  ├── create(input)       ──► POST  /rest/v1/product  ──► invalidate     │
//! │  └── update(id, patch)   ──► PATCH /rest/v1/product  ──► invalidate     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RestClient (apikey + bearer, replay on 401)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write is scoped to the store (`id = eq.<id> & store_id = eq.<store>`)
//! and invalidates the cached queries of its entity on success.
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`] - Product categories
//! - [`ProductRepository`] - Products
//! - [`TableRepository`] - Dining tables
//! - [`OrderRepository`] - Orders and the order procedures
//! - [`SummaryRepository`] - Sales summary
//! - [`StoreRepository`] - Current store and its printer settings
//! - [`MemberRepository`] - Store members
//! - [`UserRepository`] - The signed-in user

pub mod category;
pub mod member;
pub mod order;
pub mod product;
pub mod store;
pub mod summary;
pub mod table;
pub mod user;

pub use category::{CategoryPatch, CategoryRepository};
pub use member::{MemberPatch, MemberRepository};
pub use order::OrderRepository;
pub use product::{NewProduct, ProductPatch, ProductRepository};
pub use store::StoreRepository;
pub use summary::SummaryRepository;
pub use table::{TablePatch, TableRepository};
pub use user::UserRepository;

use comanda_core::Money;
use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::cache::QueryCache;
use crate::rest::{Query, RestClient};

/// Entry point to every repository.
#[derive(Clone)]
pub struct Repositories {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
}

impl Repositories {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>) -> Self {
        Repositories { rest, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn categories(&self, store_id: &str) -> CategoryRepository {
        CategoryRepository::new(self.rest.clone(), self.cache.clone(), store_id)
    }

    pub fn products(&self, store_id: &str) -> ProductRepository {
        ProductRepository::new(self.rest.clone(), self.cache.clone(), store_id)
    }

    pub fn tables(&self, store_id: &str) -> TableRepository {
        TableRepository::new(self.rest.clone(), self.cache.clone(), store_id)
    }

    pub fn orders(&self, store_id: &str) -> OrderRepository {
        OrderRepository::new(self.rest.clone(), self.cache.clone(), store_id)
    }

    pub fn summary(&self, store_id: &str) -> SummaryRepository {
        SummaryRepository::new(self.rest.clone(), self.cache.clone(), store_id)
    }

    pub fn members(&self, store_id: &str) -> MemberRepository {
        MemberRepository::new(self.rest.clone(), self.cache.clone(), store_id)
    }

    pub fn store(&self) -> StoreRepository {
        StoreRepository::new(self.rest.clone(), self.cache.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.rest.session().clone())
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Cache scope of a catalog list.
pub(crate) fn list_scope(show_all: bool) -> &'static str {
    if show_all {
        "all"
    } else {
        "active"
    }
}

/// `select=*&store_id=eq.<id>[&is_active=eq.true]&order=name.asc`
pub(crate) fn catalog_query(store_id: &str, show_all: bool) -> Query {
    let mut query = Query::new().select("*").eq("store_id", store_id);
    if !show_all {
        query = query.eq("is_active", true);
    }
    query.order("name", true)
}

/// `id = eq.<id> & store_id = eq.<store>`
pub(crate) fn row_in_store(id: &str, store_id: &str) -> Query {
    Query::new().eq("id", id).eq("store_id", store_id)
}

/// Money as the backend's `numeric` JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decimal(pub Money);

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        comanda_core::money::serialize_decimal(&self.0, serializer)
    }
}
