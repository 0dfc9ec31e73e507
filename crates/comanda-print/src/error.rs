//! # Print Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Print Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Before I/O     │  │   Connection    │  │     During print        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  PermissionDen. │  │  ConnectFailed  │  │  NotConnected           │ │
//! │  │  MissingAddress │  │  Timeout        │  │  WriteFailed            │ │
//! │  │  ImageDecode    │  │  ScanFailed     │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal. The composer turns them into a
//! [`crate::PrintOutcome`] with `success: false`.

use thiserror::Error;

/// Result type alias for printer operations.
pub type PrintResult<T> = Result<T, PrintError>;

/// Printer error type.
#[derive(Debug, Error)]
pub enum PrintError {
    // =========================================================================
    // Before any I/O
    // =========================================================================
    /// The OS refused Bluetooth / device access.
    ///
    /// ## When This Occurs
    /// ```text
    /// print(address)
    ///      │
    ///      ▼
    /// PermissionGate::check_connect ── denied ──► PermissionDenied
    ///                                              (printer never touched)
    /// ```
    #[error("Bluetooth permission denied: {0}")]
    PermissionDenied(String),

    /// No printer selected for the store.
    #[error("No printer selected")]
    MissingAddress,

    /// Logo file could not be decoded.
    #[error("Failed to decode logo: {0}")]
    ImageDecode(String),

    // =========================================================================
    // Connection
    // =========================================================================
    /// Listing paired devices failed.
    #[error("Failed to list paired printers: {0}")]
    ScanFailed(String),

    /// The printer could not be opened.
    #[error("Failed to connect to printer {address}: {reason}")]
    ConnectFailed { address: String, reason: String },

    /// The printer did not answer in time.
    #[error("Printer connection timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // During print
    // =========================================================================
    /// A primitive was called before `connect`.
    #[error("Printer not connected")]
    NotConnected,

    /// Bytes could not be written to the printer.
    #[error("Failed to write to printer: {0}")]
    WriteFailed(String),
}

impl PrintError {
    /// Whether the error was raised before the printer was touched.
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            PrintError::PermissionDenied(_) | PrintError::MissingAddress | PrintError::ImageDecode(_)
        )
    }
}
