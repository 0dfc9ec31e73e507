//! Store members (`store_member`, `get_store_members`,
//! `create_store_member_by_email`).

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use comanda_core::validation::validate_email;
use comanda_core::{MemberRole, StoreMember};

use super::row_in_store;
use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::ClientResult;
use crate::rest::RestClient;

const TABLE: &str = "store_member";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
struct StoreArgs<'a> {
    p_store_id: &'a str,
}

#[derive(Serialize)]
struct InviteArgs<'a> {
    p_email: &'a str,
    p_store_id: &'a str,
    p_role: MemberRole,
    p_is_active: bool,
}

#[derive(Clone)]
pub struct MemberRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
    store_id: String,
}

impl MemberRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>, store_id: &str) -> Self {
        MemberRepository {
            rest,
            cache,
            store_id: store_id.to_string(),
        }
    }

    /// Members with their emails, which only the procedure can see.
    pub async fn list(&self) -> ClientResult<Vec<StoreMember>> {
        let key = QueryKey::new(Entity::Members, &self.store_id, "all");
        self.cache
            .get_or_fetch(key, || async {
                self.rest
                    .rpc(
                        "get_store_members",
                        &StoreArgs {
                            p_store_id: &self.store_id,
                        },
                    )
                    .await
            })
            .await
    }

    /// Adds an existing user to the store by email.
    pub async fn invite(&self, email: &str, role: MemberRole, is_active: bool) -> ClientResult<()> {
        let email = validate_email(email)?;
        self.rest
            .rpc_unit(
                "create_store_member_by_email",
                &InviteArgs {
                    p_email: &email,
                    p_store_id: &self.store_id,
                    p_role: role,
                    p_is_active: is_active,
                },
            )
            .await?;

        self.cache.invalidate(Entity::Members, &self.store_id);
        info!(store_id = %self.store_id, email = %email, ?role, "Member invited");
        Ok(())
    }

    pub async fn update(&self, id: &str, patch: &MemberPatch) -> ClientResult<StoreMember> {
        let updated: StoreMember = self
            .rest
            .update(TABLE, &row_in_store(id, &self.store_id), patch)
            .await?;

        self.cache.invalidate(Entity::Members, &self.store_id);
        info!(store_id = %self.store_id, member_id = %id, "Member updated");
        Ok(updated)
    }
}
