//! # REST Client
//!
//! PostgREST-style access to the backend's tables and stored procedures.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  select/insert/update/rpc                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.access_token() ──► send(apikey + Bearer token)                 │
//! │                                   │                                     │
//! │                  ┌────────────────┼──────────────────┐                  │
//! │                  ▼                ▼                  ▼                  │
//! │               2xx → decode     401/403            other → Backend{..}   │
//! │                                   │                                     │
//! │                  session.refresh_after_unauthorized(token)              │
//! │                   (coalesced with every other 401 in flight)            │
//! │                                   │                                     │
//! │                       send again, once ──► 401/403 → Unauthorized       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## URL Shapes
//! - `GET   /rest/v1/product?select=*&store_id=eq.s-1&order=name.asc`
//! - `POST  /rest/v1/product` with `Prefer: return=representation`
//! - `PATCH /rest/v1/product?id=eq.p-1&store_id=eq.s-1`
//! - `POST  /rest/v1/rpc/create_dine_in_order`

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendSettings;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

const REST_PREFIX: &str = "rest/v1/";

// =============================================================================
// Query builder
// =============================================================================

/// Query-string parameters for a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to return, PostgREST syntax (`*`, `id,name`, `store(id,name)`).
    pub fn select(mut self, columns: &str) -> Self {
        self.params.retain(|(k, _)| k != "select");
        self.params.push(("select".into(), columns.into()));
        self
    }

    /// `column = value`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".into(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".into(), limit.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The filters, for error messages.
    fn describe(&self) -> String {
        self.params
            .iter()
            .filter(|(k, v)| v.starts_with("eq.") && k != "select")
            .map(|(k, v)| format!("{}={}", k, &v[3..]))
            .collect::<Vec<_>>()
            .join(",")
    }
}

// =============================================================================
// Shared HTTP helpers
// =============================================================================

/// Parses a base URL so that `join` appends instead of replacing the last
/// path segment.
pub(crate) fn normalize_base(url: &str) -> ClientResult<Url> {
    let mut base = Url::parse(url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

pub(crate) fn http_client(settings: &BackendSettings) -> ClientResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()?)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Best human-readable message from a PostgREST or GoTrue error body.
pub(crate) fn parse_error_message(body: &str, status: StatusCode) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let body = body.trim();
            (!body.is_empty()).then(|| body.chars().take(200).collect())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    parse_error_message(&body, status)
}

pub(crate) async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let message = error_message(response).await;
    warn!(status, message = %message, "Backend returned an error");
    ClientError::Backend { status, message }
}

pub(crate) async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", what, e)))
}

fn is_unauthorized(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

// =============================================================================
// Replay on 401
// =============================================================================

/// Result of one authorized attempt.
pub(crate) enum Attempt<T> {
    Done(T),
    Unauthorized(String),
}

/// Sends with the current token; on 401/403 refreshes through the session
/// and sends once more with the new token.
pub(crate) async fn replay_on_unauthorized<T, F, Fut>(
    session: &SessionManager,
    mut send: F,
) -> ClientResult<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ClientResult<Attempt<T>>>,
{
    let token = session.access_token().await?;
    match send(token.clone()).await? {
        Attempt::Done(value) => Ok(value),
        Attempt::Unauthorized(message) => {
            debug!(message = %message, "Request unauthorized, refreshing token");
            let fresh = session.refresh_after_unauthorized(&token).await?;
            match send(fresh).await? {
                Attempt::Done(value) => Ok(value),
                Attempt::Unauthorized(message) => Err(ClientError::Unauthorized(message)),
            }
        }
    }
}

// =============================================================================
// RestClient
// =============================================================================

/// Authorized table and RPC access.
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    session: Arc<SessionManager>,
}

impl RestClient {
    pub fn new(settings: &BackendSettings, session: Arc<SessionManager>) -> ClientResult<Self> {
        Ok(RestClient {
            http: http_client(settings)?,
            base: normalize_base(&settings.url)?.join(REST_PREFIX)?,
            anon_key: settings.anon_key.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// `GET /rest/v1/<table>`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> ClientResult<Vec<T>> {
        let response = self
            .execute(Method::GET, table, query.params(), None)
            .await?;
        decode(response, table).await
    }

    /// First row or `None`.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> ClientResult<Option<T>> {
        let rows: Vec<T> = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// `POST /rest/v1/<table>`, returning the inserted row.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .execute(Method::POST, table, &[], Some(&body))
            .await?;
        let rows: Vec<T> = decode(response, table).await?;
        rows.into_iter().next().ok_or_else(|| {
            ClientError::InvalidResponse(format!("{}: insert returned no row", table))
        })
    }

    /// `PATCH /rest/v1/<table>?<filters>`, returning the updated row.
    pub async fn update<B, T>(&self, table: &str, query: &Query, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self
            .execute(Method::PATCH, table, query.params(), Some(&body))
            .await?;
        let rows: Vec<T> = decode(response, table).await?;
        rows.into_iter().next().ok_or_else(|| ClientError::NotFound {
            entity: table.to_string(),
            id: query.describe(),
        })
    }

    /// `POST /rest/v1/rpc/<function>`.
    pub async fn rpc<B, T>(&self, function: &str, args: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.call_rpc(function, args).await?;
        decode(response, function).await
    }

    /// RPC whose result is not needed.
    pub async fn rpc_unit<B>(&self, function: &str, args: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.call_rpc(function, args).await.map(|_| ())
    }

    async fn call_rpc<B>(&self, function: &str, args: &B) -> ClientResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(args)?;
        let path = format!("rpc/{}", function);
        debug!(function, "Calling RPC");
        self.execute(Method::POST, &path, &[], Some(&body)).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> ClientResult<reqwest::Response> {
        let url = self.base.join(path)?;

        replay_on_unauthorized(&self.session, |token| {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .query(params);
            if let Some(body) = body {
                request = request
                    .header("Prefer", "return=representation")
                    .json(body);
            }

            async move {
                let response = request.send().await?;
                let status = response.status();
                if is_unauthorized(status) {
                    return Ok(Attempt::Unauthorized(error_message(response).await));
                }
                if !status.is_success() {
                    return Err(error_from_response(response).await);
                }
                Ok(Attempt::Done(response))
            }
        })
        .await
    }
}
