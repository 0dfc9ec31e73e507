//! The signed-in user.

use std::sync::Arc;

use comanda_core::UserIdentity;

use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

#[derive(Clone)]
pub struct UserRepository {
    session: Arc<SessionManager>,
}

impl UserRepository {
    pub fn new(session: Arc<SessionManager>) -> Self {
        UserRepository { session }
    }

    /// Identity carried by the current session; no request is made.
    pub async fn me(&self) -> ClientResult<UserIdentity> {
        self.session
            .current_user()
            .await
            .ok_or(ClientError::NotAuthenticated)
    }
}
