//! # Session State
//!
//! The signed-in user, the store they work in, and the repositories bound
//! to that session.
//!
//! ```text
//! login / restore ──► SessionManager ──► resolve_store()
//!                                            │
//!                     config [store].id? ────┤ yes: pinned store
//!                                            │ no:  first active membership
//!                                            ▼
//!                                   current store (Mutex<Option<Store>>)
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use comanda_client::{AuthBackend, PosConfig, QueryCache, Repositories, RestClient, SecureStore, SessionManager};
use comanda_core::{Store, UserIdentity, ValidationError};

use crate::error::{AppError, AppResult};

pub struct SessionState {
    session: Arc<SessionManager>,
    repos: Repositories,
    store: Mutex<Option<Store>>,
}

impl SessionState {
    pub fn new(session: Arc<SessionManager>, repos: Repositories) -> Self {
        SessionState {
            session,
            repos,
            store: Mutex::new(None),
        }
    }

    /// Wires session manager, REST client and cache from the config.
    pub fn build(
        config: &PosConfig,
        auth: Arc<dyn AuthBackend>,
        secure: Arc<dyn SecureStore>,
    ) -> AppResult<Self> {
        let session = Arc::new(SessionManager::new(auth, secure));
        let rest = Arc::new(RestClient::new(&config.backend, session.clone())?);
        let cache = Arc::new(QueryCache::new(config.cache.stale_after()));
        Ok(Self::new(session, Repositories::new(rest, cache)))
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub async fn user(&self) -> AppResult<UserIdentity> {
        self.session
            .current_user()
            .await
            .ok_or_else(AppError::unauthenticated)
    }

    pub fn current_store(&self) -> Option<Store> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_store(&self, store: Option<Store>) {
        *self.store.lock().unwrap_or_else(PoisonError::into_inner) = store;
    }

    /// Id of the current store. No store is a validation failure, raised
    /// before any request.
    pub fn store_id(&self) -> AppResult<String> {
        self.current_store()
            .map(|store| store.id)
            .ok_or_else(|| ValidationError::required("store").into())
    }

    /// Finds the store for the signed-in user and makes it current.
    pub async fn resolve_store(&self, pinned: Option<&str>) -> AppResult<Option<Store>> {
        let user = self.user().await?;

        let store = match pinned {
            Some(store_id) => {
                let config = self.repos.store().get_config(store_id).await?;
                Some(Store {
                    id: config.id,
                    name: config.name,
                })
            }
            None => self.repos.store().current_store(&user.id).await?,
        };

        match &store {
            Some(store) => info!(user_id = %user.id, store_id = %store.id, store = %store.name, "Store selected"),
            None => warn!(user_id = %user.id, "User has no active store membership"),
        }
        self.set_store(store.clone());
        Ok(store)
    }

    /// Forgets the store and every cached query.
    pub fn clear(&self) {
        self.set_store(None);
        self.repos.cache().clear();
    }
}
