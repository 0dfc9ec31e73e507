//! # Client Error Types
//!
//! Error types for backend access.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Authentication      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Unauthorized           │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  SessionExpired         │ │
//! │  │  ConfigLoad/Save│  │                 │  │  NotAuthenticated       │ │
//! │  │                 │  │                 │  │  RefreshFailed          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Backend      │  │    Payload      │  │      Storage            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Backend{status}│  │  InvalidResponse│  │  Storage                │ │
//! │  │  NotFound       │  │  Core           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use comanda_core::{CoreError, ValidationError};
use thiserror::Error;

use crate::refresh::RefreshError;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Every way a backend call can fail.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request never got a response (DNS, TLS, connection reset).
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out")]
    Timeout,

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    /// The backend rejected the credentials or the token.
    ///
    /// ## When This Occurs
    /// - Wrong email or password at login
    /// - A request still answered 401/403 after a token refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The refresh token was rejected; the user has to log in again.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// No session is active.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The refresh could not complete (network, abandoned).
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-success status with the backend's message.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// The response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A response parsed but failed business validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Secure storage error: {0}")]
    Storage(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

impl From<keyring::Error> for ClientError {
    fn from(err: keyring::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<RefreshError> for ClientError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Rejected(_) => ClientError::SessionExpired,
            other => ClientError::RefreshFailed(other.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the user has to (re)authenticate.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_)
                | ClientError::SessionExpired
                | ClientError::NotAuthenticated
                | ClientError::RefreshFailed(_)
        )
    }

    /// Returns true if trying again later may succeed.
    ///
    /// Nothing in this crate retries on its own; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::Timeout => true,
            ClientError::Backend { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
