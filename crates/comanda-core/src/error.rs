//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── CoreError        - Draft and ticket rule violations               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  comanda-print errors                                                  │
//! │  └── PrintError       - Permission, connection and write failures      │
//! │                                                                         │
//! │  comanda-client errors                                                 │
//! │  └── ClientError      - Backend, session and storage failures          │
//! │                                                                         │
//! │  apps/terminal                                                         │
//! │  └── AppError         - What the front end sees (serialized)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Draft line cannot be found.
    #[error("Order line not found: {0}")]
    ItemNotFound(String),

    /// Attempt to take a line below the minimum quantity.
    ///
    /// ## When This Occurs
    /// ```text
    /// Line "Taco" qty: 1
    ///      │
    ///      ▼
    /// decrement()
    ///      │
    ///      ▼
    /// QuantityBelowMinimum { min: 1 } ── line keeps qty 1
    /// ```
    /// Removing a line is an explicit `remove_item`, never a decrement.
    #[error("Quantity cannot go below {min}")]
    QuantityBelowMinimum { min: i64 },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Draft has reached the maximum number of lines.
    #[error("Order cannot have more than {max} lines")]
    DraftFull { max: usize },

    /// A confirmed order (from the backend) cannot be turned into a ticket.
    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidOrder error.
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        CoreError::InvalidOrder {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any network or printer call is attempted, so a
/// validation failure never has side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The order has no lines.
    #[error("Order has no items")]
    EmptyOrder,
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityBelowMinimum { min: 1 };
        assert_eq!(err.to_string(), "Quantity cannot go below 1");

        let err = CoreError::QuantityTooLarge {
            requested: 1000,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1000 exceeds maximum allowed (999)");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("customer name").to_string(),
            "customer name is required"
        );
        assert_eq!(ValidationError::EmptyOrder.to_string(), "Order has no items");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("table").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
