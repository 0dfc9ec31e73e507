//! # Auth Backend
//!
//! Password login, token refresh and sign-out against a GoTrue-compatible
//! auth server.
//!
//! ```text
//! POST /auth/v1/token?grant_type=password        { email, password }
//! POST /auth/v1/token?grant_type=refresh_token   { refresh_token }
//! POST /auth/v1/logout                           Authorization: Bearer <access>
//! ```
//!
//! All three answer with the same token payload (logout answers 204):
//!
//! ```json
//! {
//!   "access_token": "eyJ...", "refresh_token": "v1.M...",
//!   "expires_in": 3600, "expires_at": 1714567890,
//!   "user": { "id": "...", "email": "...", "user_metadata": { "role": "..." } }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use comanda_core::UserIdentity;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::config::BackendSettings;
use crate::error::{ClientError, ClientResult};
use crate::rest::{decode, error_from_response, error_message, http_client, normalize_base};
use crate::token::{Session, TokenPair};

/// Auth server seam. Faked in tests.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<Session>;

    /// Exchanges a refresh token for a new session. Refresh tokens are
    /// single use.
    async fn refresh(&self, refresh_token: &str) -> ClientResult<Session>;

    /// Revokes the session server-side.
    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    role: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let reported: Option<DateTime<Utc>> = self
            .expires_at
            .and_then(|at| Utc.timestamp_opt(at, 0).single())
            .or_else(|| self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));

        Session {
            tokens: TokenPair::new(self.access_token, self.refresh_token, reported),
            user: UserIdentity {
                id: self.user.id,
                email: self.user.email,
                role: self.user.user_metadata.and_then(|m| m.role),
            },
        }
    }
}

// =============================================================================
// GoTrueAuth
// =============================================================================

/// HTTP implementation of [`AuthBackend`].
pub struct GoTrueAuth {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl GoTrueAuth {
    pub fn new(settings: &BackendSettings) -> ClientResult<Self> {
        Ok(GoTrueAuth {
            http: http_client(settings)?,
            base: normalize_base(&settings.url)?.join("auth/v1/")?,
            anon_key: settings.anon_key.clone(),
        })
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> ClientResult<Session> {
        let url = self.base.join("token")?;
        let response = self
            .http
            .post(url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if is_credential_rejection(status) {
            return Err(ClientError::Unauthorized(error_message(response).await));
        }
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let payload: TokenResponse = decode(response, "auth token").await?;
        Ok(payload.into_session())
    }
}

/// GoTrue answers bad credentials and spent refresh tokens with 400.
fn is_credential_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

#[async_trait]
impl AuthBackend for GoTrueAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<Session> {
        debug!(email, "Signing in with password");
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> ClientResult<Session> {
        debug!("Refreshing access token");
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let url = self.base.join("logout")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}
