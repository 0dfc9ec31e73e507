//! # Session Manager
//!
//! Owns the login session: restore at start-up, login, logout, and the token
//! every backend request carries.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                 restore() / login()                                     │
//! │   ┌─────────┐ ─────────────────────► ┌───────────────────────────┐      │
//! │   │ Loading │                        │ Authenticated(UserIdentity)│     │
//! │   └────┬────┘                        └─────────────┬─────────────┘      │
//! │        │ nothing stored /                          │ logout() /         │
//! │        │ refresh failed /                          │ refresh rejected   │
//! │        │ bad credentials                           ▼                    │
//! │        └──────────────────────────────► ┌─────────────────┐             │
//! │                                         │ Unauthenticated │             │
//! │                                         └─────────────────┘             │
//! │                                                                         │
//! │  Published on a watch channel; subscribe() to follow changes.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each session gets its own [`RefreshCoordinator`]. Logging out drops it,
//! so a refresh that finishes after logout cannot resurrect the session.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use comanda_core::validation::validate_email;
use comanda_core::{UserIdentity, ValidationError};

use crate::auth::AuthBackend;
use crate::error::{ClientError, ClientResult};
use crate::refresh::{RefreshCoordinator, RefreshError, RefreshOutcome};
use crate::storage::{SecureStore, AUTH_KEY};
use crate::token::Session;

/// Authentication state as seen by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Authenticated(UserIdentity),
    Unauthenticated,
}

impl AuthState {
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

struct ActiveSession {
    session: Session,
    refresher: Arc<RefreshCoordinator>,
}

pub struct SessionManager {
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn SecureStore>,
    active: RwLock<Option<ActiveSession>>,
    state: watch::Sender<AuthState>,
    last_login_error: Mutex<Option<String>>,
}

impl SessionManager {
    /// Starts in `Loading` until [`restore`](Self::restore) or
    /// [`login`](Self::login) settles it.
    pub fn new(backend: Arc<dyn AuthBackend>, store: Arc<dyn SecureStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        SessionManager {
            backend,
            store,
            active: RwLock::new(None),
            state,
            last_login_error: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|active| active.session.user.clone())
    }

    /// Message of the last failed login, cleared by the next attempt.
    pub fn last_login_error(&self) -> Option<String> {
        self.last_login_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Picks up the session stored by a previous run.
    pub async fn restore(&self) -> AuthState {
        self.set_state(AuthState::Loading);

        let stored = match self.store.get(AUTH_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Could not read stored session");
                None
            }
        };
        let Some(json) = stored else {
            debug!("No stored session");
            return self.set_state(AuthState::Unauthenticated);
        };

        let session = match Session::from_json(&json) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Stored session unreadable, discarding");
                self.clear_storage();
                return self.set_state(AuthState::Unauthenticated);
            }
        };

        let session = if session.tokens.needs_refresh() {
            info!(user_id = %session.user.id, "Stored session expired, refreshing");
            match self.backend.refresh(&session.tokens.refresh_token).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    warn!(error = %e, "Could not refresh stored session");
                    self.clear_storage();
                    return self.set_state(AuthState::Unauthenticated);
                }
            }
        } else {
            session
        };

        info!(user_id = %session.user.id, "Session restored");
        self.install(session).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserIdentity> {
        self.set_login_error(None);

        let email = match validate_login(email, password) {
            Ok(email) => email,
            Err(e) => {
                self.set_login_error(Some(e.to_string()));
                return Err(e.into());
            }
        };

        self.set_state(AuthState::Loading);
        match self.backend.sign_in_with_password(&email, password).await {
            Ok(session) => {
                let user = session.user.clone();
                self.install(session).await;
                info!(user_id = %user.id, "Logged in");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.set_login_error(Some(e.to_string()));
                self.set_state(AuthState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Ends the session locally even if the server sign-out fails.
    pub async fn logout(&self) {
        let previous = self.active.write().await.take();
        if let Some(active) = previous {
            if let Err(e) = self
                .backend
                .sign_out(&active.session.tokens.access_token)
                .await
            {
                warn!(error = %e, "Server sign-out failed, clearing local session anyway");
            }
        }

        self.clear_storage();
        self.set_state(AuthState::Unauthenticated);
        info!("Logged out");
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Token for the next request. Refreshes first when it is about to expire.
    pub async fn access_token(&self) -> ClientResult<String> {
        let (token, expiring) = {
            let guard = self.active.read().await;
            let active = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;
            (
                active.session.tokens.access_token.clone(),
                active.session.tokens.needs_refresh(),
            )
        };

        if expiring {
            debug!("Access token about to expire, refreshing");
            return self.refresh_after_unauthorized(&token).await;
        }
        Ok(token)
    }

    /// Called when a request made with `stale_token` was rejected.
    ///
    /// Returns the current token straight away if someone already replaced
    /// `stale_token`; otherwise joins or leads the session's refresh.
    pub async fn refresh_after_unauthorized(&self, stale_token: &str) -> ClientResult<String> {
        let refresher = {
            let guard = self.active.read().await;
            let active = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;
            if active.session.tokens.access_token != stale_token {
                return Ok(active.session.tokens.access_token.clone());
            }
            active.refresher.clone()
        };

        refresher
            .refresh(|| self.run_refresh(&refresher, stale_token))
            .await
            .map_err(ClientError::from)
    }

    /// Leader side of a refresh.
    async fn run_refresh(
        &self,
        refresher: &Arc<RefreshCoordinator>,
        stale_token: &str,
    ) -> RefreshOutcome {
        let refresh_token = {
            let guard = self.active.read().await;
            match guard.as_ref() {
                Some(active) if Arc::ptr_eq(&active.refresher, refresher) => {
                    // a refresh finished between our read and taking the lead
                    if active.session.tokens.access_token != stale_token {
                        return Ok(active.session.tokens.access_token.clone());
                    }
                    active.session.tokens.refresh_token.clone()
                }
                _ => return Err(RefreshError::Abandoned),
            }
        };

        match self.backend.refresh(&refresh_token).await {
            Ok(fresh) => {
                {
                    let mut guard = self.active.write().await;
                    match guard.as_mut() {
                        Some(active) if Arc::ptr_eq(&active.refresher, refresher) => {
                            active.session = fresh.clone();
                        }
                        // logged out while refreshing
                        _ => return Err(RefreshError::Abandoned),
                    }
                }
                self.persist(&fresh);
                info!(
                    user_id = %fresh.user.id,
                    expires_in_secs = fresh.tokens.remaining_secs(),
                    "Access token refreshed"
                );
                Ok(fresh.tokens.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.end_session(refresher).await;
                if e.is_auth_error() {
                    Err(RefreshError::Rejected(e.to_string()))
                } else {
                    Err(RefreshError::Failed(e.to_string()))
                }
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn install(&self, session: Session) -> AuthState {
        self.persist(&session);
        let user = session.user.clone();
        *self.active.write().await = Some(ActiveSession {
            session,
            refresher: Arc::new(RefreshCoordinator::new()),
        });
        self.set_state(AuthState::Authenticated(user))
    }

    async fn end_session(&self, refresher: &Arc<RefreshCoordinator>) {
        {
            let mut guard = self.active.write().await;
            match guard.as_ref() {
                Some(active) if Arc::ptr_eq(&active.refresher, refresher) => {
                    *guard = None;
                }
                _ => return,
            }
        }
        self.clear_storage();
        self.set_state(AuthState::Unauthenticated);
    }

    fn persist(&self, session: &Session) {
        let result = session
            .to_json()
            .map_err(ClientError::from)
            .and_then(|json| self.store.set(AUTH_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Could not persist session");
        }
    }

    fn clear_storage(&self) {
        if let Err(e) = self.store.delete(AUTH_KEY) {
            warn!(error = %e, "Could not clear stored session");
        }
    }

    fn set_state(&self, state: AuthState) -> AuthState {
        self.state.send_replace(state.clone());
        state
    }

    fn set_login_error(&self, error: Option<String>) {
        *self
            .last_login_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = error;
    }
}

fn validate_login(email: &str, password: &str) -> Result<String, ValidationError> {
    let email = validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::{session_with, signed_in, FakeAuth};
    use chrono::{Duration, Utc};

    fn manager(auth: Arc<FakeAuth>, store: Arc<MemoryStore>) -> SessionManager {
        SessionManager::new(auth, store)
    }

    #[tokio::test]
    async fn test_restore_without_stored_session() {
        let session = manager(Arc::new(FakeAuth::new()), Arc::new(MemoryStore::new()));
        assert_eq!(session.state(), AuthState::Loading);

        assert_eq!(session.restore().await, AuthState::Unauthenticated);
        assert!(matches!(
            session.access_token().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_restore_valid_session_skips_refresh() {
        let auth = Arc::new(FakeAuth::new());
        let store = Arc::new(MemoryStore::new());
        let stored = session_with("access-9", Utc::now() + Duration::hours(1));
        store.set(AUTH_KEY, &stored.to_json().unwrap()).unwrap();

        let session = manager(auth.clone(), store);
        let state = session.restore().await;

        assert_eq!(state.user().map(|u| u.id.as_str()), Some("u-1"));
        assert_eq!(session.access_token().await.unwrap(), "access-9");
        assert_eq!(auth.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_expired_session_refreshes() {
        let auth = Arc::new(FakeAuth::new());
        let store = Arc::new(MemoryStore::new());
        let stored = session_with("old", Utc::now() - Duration::minutes(5));
        store.set(AUTH_KEY, &stored.to_json().unwrap()).unwrap();

        let session = manager(auth.clone(), store.clone());
        assert!(matches!(session.restore().await, AuthState::Authenticated(_)));
        assert_eq!(session.access_token().await.unwrap(), "access-1");

        // the rotated tokens were persisted
        let persisted = Session::from_json(&store.get(AUTH_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted.tokens.access_token, "access-1");
    }

    #[tokio::test]
    async fn test_restore_failed_refresh_clears_storage() {
        let auth = Arc::new(FakeAuth::new().rejecting_refresh());
        let store = Arc::new(MemoryStore::new());
        let stored = session_with("old", Utc::now() - Duration::minutes(5));
        store.set(AUTH_KEY, &stored.to_json().unwrap()).unwrap();

        let session = manager(auth, store.clone());
        assert_eq!(session.restore().await, AuthState::Unauthenticated);
        assert!(store.get(AUTH_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_discards_garbage() {
        let store = Arc::new(MemoryStore::new());
        store.set(AUTH_KEY, "{not json").unwrap();

        let session = manager(Arc::new(FakeAuth::new()), store.clone());
        assert_eq!(session.restore().await, AuthState::Unauthenticated);
        assert!(store.get(AUTH_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_success_persists() {
        let store = Arc::new(MemoryStore::new());
        let session = manager(Arc::new(FakeAuth::new()), store.clone());
        let mut updates = session.subscribe();

        let user = session.login("ana@example.com", "secret").await.unwrap();

        assert_eq!(user.id, "u-1");
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), AuthState::Authenticated(user));
        assert!(store.get(AUTH_KEY).unwrap().is_some());
        assert!(session.last_login_error().is_none());
    }

    #[tokio::test]
    async fn test_login_failure_records_error() {
        let session = manager(Arc::new(FakeAuth::new()), Arc::new(MemoryStore::new()));

        let err = session.login("ana@example.com", "wrong").await.unwrap_err();

        assert!(err.is_auth_error());
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session
            .last_login_error()
            .unwrap()
            .contains("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_input_before_network() {
        let auth = Arc::new(FakeAuth::new());
        let session = manager(auth.clone(), Arc::new(MemoryStore::new()));

        assert!(session.login("not-an-email", "secret").await.is_err());
        assert!(session.login("ana@example.com", "").await.is_err());
        assert_eq!(auth.sign_in_calls(), 0);
        assert!(session.last_login_error().is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_even_if_server_fails() {
        let auth = Arc::new(FakeAuth::new().failing_sign_out());
        let session = signed_in(auth.clone(), "access-0").await;

        session.logout().await;

        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session.current_user().await.is_none());
        assert_eq!(auth.sign_out_calls(), 1);
        assert!(matches!(
            session.refresh_after_unauthorized("access-0").await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_stale_token_returns_current() {
        let auth = Arc::new(FakeAuth::new());
        let session = signed_in(auth.clone(), "access-0").await;

        let fresh = session.refresh_after_unauthorized("access-0").await.unwrap();
        assert_eq!(fresh, "access-1");

        // a late 401 for the old token does not refresh again
        let again = session.refresh_after_unauthorized("access-0").await.unwrap();
        assert_eq!(again, "access-1");
        assert_eq!(auth.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_ends_session() {
        let auth = Arc::new(FakeAuth::new().rejecting_refresh());
        let session = signed_in(auth, "access-0").await;

        let err = session
            .refresh_after_unauthorized("access-0")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }
}
