//! Fakes shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use comanda_core::UserIdentity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::auth::AuthBackend;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;
use crate::storage::{MemoryStore, SecureStore, AUTH_KEY};
use crate::token::{Session, TokenPair};

pub(crate) fn session_with(access_token: &str, expires_at: DateTime<Utc>) -> Session {
    Session {
        tokens: TokenPair {
            access_token: access_token.to_string(),
            refresh_token: format!("refresh-for-{}", access_token),
            expires_at,
        },
        user: UserIdentity {
            id: "u-1".into(),
            email: Some("ana@example.com".into()),
            role: None,
        },
    }
}

/// A session manager already holding `access_token`, valid for an hour.
pub(crate) async fn signed_in(auth: Arc<FakeAuth>, access_token: &str) -> Arc<SessionManager> {
    let store = Arc::new(MemoryStore::new());
    let session = session_with(access_token, Utc::now() + Duration::hours(1));
    store
        .set(AUTH_KEY, &session.to_json().unwrap())
        .unwrap();

    let manager = Arc::new(SessionManager::new(auth, store));
    manager.restore().await;
    manager
}

/// Auth server that accepts the password "secret" and hands out
/// `access-<n>` on the n-th refresh.
#[derive(Default)]
pub(crate) struct FakeAuth {
    sign_in_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    reject_refresh: bool,
    refresh_delay: bool,
    fail_sign_out: bool,
}

impl FakeAuth {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting_refresh(mut self) -> Self {
        self.reject_refresh = true;
        self
    }

    /// Keeps the refresh pending long enough for other callers to queue.
    pub(crate) fn with_refresh_delay(mut self) -> Self {
        self.refresh_delay = true;
        self
    }

    pub(crate) fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub(crate) fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn sign_in_with_password(&self, _email: &str, password: &str) -> ClientResult<Session> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if password == "secret" {
            Ok(session_with("access-0", Utc::now() + Duration::hours(1)))
        } else {
            Err(ClientError::Unauthorized("Invalid login credentials".into()))
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> ClientResult<Session> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refresh_delay {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        if self.reject_refresh {
            return Err(ClientError::Unauthorized("Invalid Refresh Token".into()));
        }
        Ok(session_with(
            &format!("access-{}", n),
            Utc::now() + Duration::hours(1),
        ))
    }

    async fn sign_out(&self, _access_token: &str) -> ClientResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            Err(ClientError::Http("connection reset".into()))
        } else {
            Ok(())
        }
    }
}
