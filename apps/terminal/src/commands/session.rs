//! # Session Commands
//!
//! Sign in, resume a stored session, sign out.
//!
//! ```text
//! restore() ──► Authenticated? ──yes──► resolve_store()
//!                    │ no
//!                    ▼
//!             login(email, pw) ──► resolve_store()
//!
//! logout() ──► server sign-out (best effort) ──► drop store, cache, draft
//! ```

use serde::Serialize;
use tracing::{debug, info};

use comanda_client::AuthState;
use comanda_core::{Store, UserIdentity};

use crate::error::AppResult;
use crate::state::{ConfigState, DraftState, SessionState};

/// Who is signed in and where.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub user: UserIdentity,
    pub store: Option<Store>,
}

pub async fn login(
    session: &SessionState,
    config: &ConfigState,
    email: &str,
    password: &str,
) -> AppResult<SessionInfo> {
    debug!("login command");
    let user = session.session().login(email, password).await?;
    let store = session.resolve_store(config.store_override()).await?;
    Ok(SessionInfo { user, store })
}

/// Resumes the session stored by a previous run, if any.
pub async fn restore(session: &SessionState, config: &ConfigState) -> AppResult<Option<SessionInfo>> {
    debug!("restore command");
    match session.session().restore().await {
        AuthState::Authenticated(user) => {
            let store = session.resolve_store(config.store_override()).await?;
            Ok(Some(SessionInfo { user, store }))
        }
        _ => Ok(None),
    }
}

/// Current session; an error when signed out.
pub async fn whoami(session: &SessionState) -> AppResult<SessionInfo> {
    let user = session.user().await?;
    Ok(SessionInfo {
        user,
        store: session.current_store(),
    })
}

pub async fn logout(session: &SessionState, draft: &DraftState) -> AppResult<()> {
    debug!("logout command");
    session.session().logout().await;
    session.clear();
    draft.reset();
    info!("Terminal signed out");
    Ok(())
}

/// Message of the last failed login, for the sign-in screen.
pub fn last_login_error(session: &SessionState) -> Option<String> {
    session.session().last_login_error()
}
