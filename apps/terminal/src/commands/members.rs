//! # Member Commands
//!
//! Staff of the current store.

use tracing::debug;

use comanda_client::repository::MemberPatch;
use comanda_core::{MemberRole, StoreMember};

use crate::error::AppResult;
use crate::state::SessionState;

pub async fn list_members(session: &SessionState) -> AppResult<Vec<StoreMember>> {
    debug!("list_members command");
    let store_id = session.store_id()?;
    Ok(session.repos().members(&store_id).list().await?)
}

/// Adds an existing account to the store.
pub async fn invite_member(
    session: &SessionState,
    email: &str,
    role: MemberRole,
    is_active: bool,
) -> AppResult<()> {
    debug!(?role, is_active, "invite_member command");
    let store_id = session.store_id()?;
    Ok(session
        .repos()
        .members(&store_id)
        .invite(email, role, is_active)
        .await?)
}

pub async fn update_member(
    session: &SessionState,
    id: &str,
    patch: &MemberPatch,
) -> AppResult<StoreMember> {
    let store_id = session.store_id()?;
    Ok(session.repos().members(&store_id).update(id, patch).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_app;

    #[tokio::test]
    async fn test_invalid_email_rejected_without_request() {
        let app = test_app().await;

        let err = invite_member(&app.state.session, "not-an-email", MemberRole::Staff, true)
            .await
            .unwrap_err();

        assert!(err.is_validation());
    }
}
