//! # comanda-core: Pure Business Logic for Comanda POS
//!
//! This crate is the **heart** of Comanda POS. It contains the order draft,
//! the kitchen ticket snapshot and every business rule as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Comanda POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/terminal (commands)                     │   │
//! │  │    send_to_kitchen, reprint_order, select_printer, ...          │   │
//! │  └──────────────┬───────────────────────────────┬──────────────────┘   │
//! │                 │                               │                       │
//! │  ┌──────────────▼─────────────┐  ┌──────────────▼─────────────────┐    │
//! │  │ comanda-print              │  │ comanda-client                 │    │
//! │  │ composer, ESC/POS, BT      │  │ REST, session, cache           │    │
//! │  └──────────────┬─────────────┘  └──────────────┬─────────────────┘    │
//! │                 │                               │                       │
//! │  ┌──────────────▼───────────────────────────────▼─────────────────┐    │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │    │
//! │  │                                                                 │    │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │    │
//! │  │   │  types  │ │  money  │ │  draft  │ │ ticket  │ │   text   │ │    │
//! │  │   │ Product │ │  Money  │ │ Order-  │ │ Print-  │ │normalize │ │    │
//! │  │   │ Order   │ │         │ │  Draft  │ │  Order  │ │          │ │    │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO NETWORK • NO BLUETOOTH • PURE FUNCTIONS           │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, DiningTable, StoreConfig, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`draft`] - The in-memory order being built at the point of sale
//! - [`ticket`] - Immutable snapshot of a confirmed order for printing
//! - [`text`] - Printer-safe text normalization
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::draft::OrderDraft;
//! use comanda_core::money::Money;
//!
//! let mut draft = OrderDraft::new();
//! let uid = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();
//! draft.increment(&uid).unwrap();
//!
//! assert_eq!(draft.total().to_decimal_string(), "50.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod money;
pub mod text;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use draft::{DraftTotals, OrderDraft, OrderItemDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use text::normalize_for_printer;
pub use ticket::{PrintItem, PrintOrder};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines allowed in a single order draft.
///
/// ## Business Reason
/// A kitchen ticket with more lines than this is almost certainly a mistake
/// (a stuck key, a double tap loop) and would waste paper.
pub const MAX_DRAFT_ITEMS: usize = 100;

/// Maximum quantity of a single draft line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Minimum quantity of a draft line. The UI blocks decrementing below it and
/// the draft enforces it.
pub const MIN_ITEM_QUANTITY: i64 = 1;
