//! # Validation Module
//!
//! Business rule validation for Comanda POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                    │
//! │  └── Disables buttons, immediate feedback                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Terminal command (Rust)                                      │
//! │  └── THIS MODULE: runs before ANY network or printer call              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Row-level security, constraints                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{validate_name, validate_submission};
//! use comanda_core::{Money, OrderDraft, OrderType};
//!
//! validate_name("table name", "Terraza 1").unwrap();
//!
//! let mut draft = OrderDraft::new();
//! draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();
//! draft.set_order_type(OrderType::Takeaway);
//! draft.set_customer_name(Some("   ".to_string()));
//! assert!(validate_submission(&draft).is_err());
//! ```

use crate::draft::OrderDraft;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::OrderType;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for products, categories, tables and customers.
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name and returns it trimmed.
///
/// ## Rules
/// - Must not be blank
/// - At most `MAX_NAME_LENGTH` characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Validates an email address for member invitations.
///
/// Deliberately loose: one `@`, something on both sides, a dot in the
/// domain. The backend is the authority.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "expected user@domain".to_string(),
    };

    let (user, domain) = email.split_once('@').ok_or_else(invalid)?;
    if user.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(email.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a catalog price.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Submission
// =============================================================================

/// Checks a draft can be sent to the kitchen.
///
/// ## Rules
/// - At least one line
/// - Dine-in: a table is selected
/// - Takeaway: customer name is not blank
pub fn validate_submission(draft: &OrderDraft) -> ValidationResult<()> {
    if draft.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }

    match draft.order_type {
        OrderType::DineIn => {
            if draft.table_id.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err(ValidationError::required("table"));
            }
        }
        OrderType::Takeaway => {
            let name = draft.customer_name.as_deref().unwrap_or("");
            validate_name("customer name", name)?;
        }
    }

    Ok(())
}

/// Checks a draft can be appended to an open order. Only lines matter; the
/// header belongs to the existing order.
pub fn validate_append(draft: &OrderDraft) -> ValidationResult<()> {
    if draft.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    Ok(())
}
