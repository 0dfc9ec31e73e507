//! # comanda-client: Backend Access for Comanda POS
//!
//! Talks to the hosted backend (PostgREST tables and procedures behind a
//! GoTrue auth service) on behalf of one signed-in user.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  repository.list()                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QueryCache ── fresh hit ──────────────────────────────► value          │
//! │       │ miss / stale                                                    │
//! │       ▼                                                                 │
//! │  RestClient ── access_token() ──► SessionManager                        │
//! │       │                               │ expires within 60s?             │
//! │       │                               └──► RefreshCoordinator (once)    │
//! │       ▼                                                                 │
//! │  GET /rest/v1/...  ── 401/403 ──► refresh_after_unauthorized ──► replay │
//! │       │                                   │ refresh rejected            │
//! │       ▼                                   ▼                             │
//! │     value                         session ends, Unauthenticated         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - `pos.toml` loading, env overrides, validation
//! - [`storage`] - Secure key/value storage (OS keyring, in-memory)
//! - [`token`] - Token pair, expiry from the JWT `exp` claim
//! - [`refresh`] - Single-flight refresh shared by concurrent callers
//! - [`auth`] - Auth service calls (password sign-in, refresh, sign-out)
//! - [`session`] - Session lifecycle and the observable [`AuthState`]
//! - [`rest`] - Authenticated REST/RPC client
//! - [`cache`] - Keyed query cache with a stale time
//! - [`repository`] - Typed access to every backend entity

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod refresh;
pub mod repository;
pub mod rest;
pub mod session;
pub mod storage;
pub mod token;

#[cfg(test)]
mod testing;

pub use auth::{AuthBackend, GoTrueAuth};
pub use cache::{Entity, QueryCache, QueryKey};
pub use config::PosConfig;
pub use error::{ClientError, ClientResult};
pub use refresh::{RefreshCoordinator, RefreshError};
pub use repository::Repositories;
pub use rest::{Query, RestClient};
pub use session::{AuthState, SessionManager};
pub use storage::{KeyringStore, MemoryStore, SecureStore, AUTH_KEY, PRINTER_KEY};
pub use token::{Session, TokenPair};
