//! # App Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Comanda POS                            │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, AppError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Draft invalid? ─── ValidationError::EmptyOrder ─────┐                  │
//! │         │                                            │                  │
//! │         ▼                                            ▼                  │
//! │  Backend failed? ── ClientError::SessionExpired ── AppError ──► front   │
//! │         │                                            ▲         end      │
//! │         ▼                                            │                  │
//! │  Printer failed? ── PrintError::PermissionDenied ────┘                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────────────────────►    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A front end receives `{ "code": "VALIDATION_ERROR", "message": "..." }`.

use serde::Serialize;

use comanda_client::ClientError;
use comanda_core::{CoreError, ValidationError};
use comanda_print::PrintError;

/// Result type alias for commands.
pub type AppResult<T> = Result<T, AppError>;

/// Error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "order not found: o-1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input or draft rejected before any side effect
    ValidationError,

    /// Entity does not exist in the store
    NotFound,

    /// Signed out, or the session could not be refreshed
    Unauthenticated,

    /// Bluetooth / device access refused by the OS
    PermissionDenied,

    /// Printer could not be reached or stopped mid-ticket
    PrinterError,

    /// Backend unreachable or answered with an error
    BackendError,

    /// Draft mutation rejected (quantity bounds, unknown line)
    DraftError,

    /// Configuration missing or invalid
    ConfigError,

    /// Everything else
    Internal,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthenticated() -> Self {
        AppError::new(ErrorCode::Unauthenticated, "Not signed in")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    pub fn is_validation(&self) -> bool {
        self.code == ErrorCode::ValidationError
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::InvalidOrder { reason } => {
                tracing::error!(reason = %reason, "Backend returned an order that cannot be printed");
                AppError::new(ErrorCode::BackendError, format!("Invalid order: {}", reason))
            }
            CoreError::ItemNotFound(uid) => AppError::not_found("Order line", &uid),
            e @ (CoreError::QuantityBelowMinimum { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::DraftFull { .. }) => AppError::new(ErrorCode::DraftError, e.to_string()),
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(e) => e.into(),
            ClientError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            ClientError::NotAuthenticated => AppError::unauthenticated(),
            e @ (ClientError::Unauthorized(_)
            | ClientError::SessionExpired
            | ClientError::RefreshFailed(_)) => {
                AppError::new(ErrorCode::Unauthenticated, e.to_string())
            }
            e @ (ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_)) => {
                AppError::new(ErrorCode::ConfigError, e.to_string())
            }
            ClientError::Storage(e) => {
                tracing::error!(error = %e, "Secure storage failed");
                AppError::internal(format!("Secure storage failed: {}", e))
            }
            e => AppError::new(ErrorCode::BackendError, e.to_string()),
        }
    }
}

impl From<PrintError> for AppError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::PermissionDenied(_) => {
                AppError::new(ErrorCode::PermissionDenied, err.to_string())
            }
            PrintError::MissingAddress => AppError::validation(err.to_string()),
            e => AppError::new(ErrorCode::PrinterError, e.to_string()),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
