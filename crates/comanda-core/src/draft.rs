//! # Order Draft
//!
//! The order being assembled at the point of sale, before it exists on the
//! backend.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Operations                                     │
//! │                                                                         │
//! │  Staff Action             Draft Method             State Change         │
//! │  ────────────             ────────────             ────────────         │
//! │                                                                         │
//! │  Tap Product ────────────► add_product() ────────► items.push(line)     │
//! │                                                    (always a new line) │
//! │  + / - ──────────────────► increment/decrement ──► line.quantity ± 1    │
//! │                                                    (never below 1)     │
//! │  Type Note ──────────────► set_notes() ──────────► line.notes           │
//! │                                                                         │
//! │  Trash Icon ─────────────► remove_item() ────────► items.remove(i)      │
//! │                                                                         │
//! │  Pick Table / Name ──────► select_table() ───────► table_id             │
//! │                            set_customer_name() ──► customer_name        │
//! │                                                                         │
//! │  Order Sent ─────────────► reset() ──────────────► fresh empty draft    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Every line has `quantity >= 1` and `<= MAX_ITEM_QUANTITY`
//! - At most `MAX_DRAFT_ITEMS` lines
//! - `total() == Σ price × quantity`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewOrderLine, OrderType, Product};
use crate::{MAX_DRAFT_ITEMS, MAX_ITEM_QUANTITY, MIN_ITEM_QUANTITY};

// =============================================================================
// Draft Line
// =============================================================================

/// One line of the draft.
///
/// ## Design Notes
/// - `uid`: client-generated, identifies the line (two taps on the same
///   product give two lines with different uids)
/// - `price`: unit price frozen when the line was added, overridable at the
///   POS through [`OrderDraft::set_unit_price`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDraft {
    pub uid: String,
    pub product_id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub notes: Option<String>,
}

impl OrderItemDraft {
    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }

    /// The payload sent to the order RPCs.
    pub fn to_new_line(&self) -> NewOrderLine {
        NewOrderLine {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            price: self.price,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

// =============================================================================
// Draft
// =============================================================================

/// The order draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub customer_name: Option<String>,
    items: Vec<OrderItemDraft>,
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Creates a new empty dine-in draft.
    pub fn new() -> Self {
        OrderDraft {
            order_type: OrderType::default(),
            table_id: None,
            customer_name: None,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Lines in the order they were added.
    pub fn items(&self) -> &[OrderItemDraft] {
        &self.items
    }

    /// Looks up a line by uid.
    pub fn item(&self, uid: &str) -> Option<&OrderItemDraft> {
        self.items.iter().find(|i| i.uid == uid)
    }

    fn item_mut(&mut self, uid: &str) -> CoreResult<&mut OrderItemDraft> {
        self.items
            .iter_mut()
            .find(|i| i.uid == uid)
            .ok_or_else(|| CoreError::ItemNotFound(uid.to_string()))
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Appends a product as a new line with quantity 1 and returns its uid.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<String> {
        self.add_line(&product.id, &product.name, product.price)
    }

    /// Appends a line with quantity 1 and returns its uid.
    pub fn add_line(
        &mut self,
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
    ) -> CoreResult<String> {
        if self.items.len() >= MAX_DRAFT_ITEMS {
            return Err(CoreError::DraftFull {
                max: MAX_DRAFT_ITEMS,
            });
        }
        if price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "price".to_string(),
            }
            .into());
        }

        let uid = Uuid::new_v4().to_string();
        self.items.push(OrderItemDraft {
            uid: uid.clone(),
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity: MIN_ITEM_QUANTITY,
            notes: None,
        });
        Ok(uid)
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - Below 1: `QuantityBelowMinimum` (use `remove_item` to drop a line)
    /// - Above 999: `QuantityTooLarge`
    pub fn set_quantity(&mut self, uid: &str, quantity: i64) -> CoreResult<()> {
        check_quantity(quantity)?;
        self.item_mut(uid)?.quantity = quantity;
        Ok(())
    }

    /// Adds one to a line's quantity.
    pub fn increment(&mut self, uid: &str) -> CoreResult<()> {
        let item = self.item_mut(uid)?;
        let next = item.quantity + 1;
        check_quantity(next)?;
        item.quantity = next;
        Ok(())
    }

    /// Takes one from a line's quantity. Rejected at quantity 1.
    pub fn decrement(&mut self, uid: &str) -> CoreResult<()> {
        let item = self.item_mut(uid)?;
        let next = item.quantity - 1;
        check_quantity(next)?;
        item.quantity = next;
        Ok(())
    }

    /// Sets or clears the kitchen note of a line. Blank notes clear it.
    pub fn set_notes(&mut self, uid: &str, notes: Option<&str>) -> CoreResult<()> {
        let item = self.item_mut(uid)?;
        item.notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Ok(())
    }

    /// Overrides the unit price of a line.
    pub fn set_unit_price(&mut self, uid: &str, price: Money) -> CoreResult<()> {
        if price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "price".to_string(),
            }
            .into());
        }
        self.item_mut(uid)?.price = price;
        Ok(())
    }

    /// Removes a line.
    pub fn remove_item(&mut self, uid: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.uid != uid);

        if self.items.len() == initial_len {
            Err(CoreError::ItemNotFound(uid.to_string()))
        } else {
            Ok(())
        }
    }

    // -------------------------------------------------------------------------
    // Header
    // -------------------------------------------------------------------------

    /// Switches between dine-in and takeaway. Table and name are kept so
    /// toggling back and forth does not lose input.
    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.order_type = order_type;
    }

    pub fn select_table(&mut self, table_id: Option<String>) {
        self.table_id = table_id.filter(|t| !t.trim().is_empty());
    }

    pub fn set_customer_name(&mut self, name: Option<String>) {
        self.customer_name = name;
    }

    /// Removes every line, keeps the header.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Back to a fresh draft. Called after a successful submission.
    pub fn reset(&mut self) {
        *self = OrderDraft::new();
    }

    /// Drops the lines of a submitted snapshot. Lines added after the
    /// snapshot was taken stay, together with the header. With nothing
    /// left the draft starts over.
    pub fn remove_submitted(&mut self, submitted: &OrderDraft) {
        self.items.retain(|line| submitted.item(&line.uid).is_none());
        if self.items.is_empty() {
            self.reset();
        }
    }

    // -------------------------------------------------------------------------
    // Derived
    // -------------------------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ price × quantity.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItemDraft::line_total).sum()
    }

    /// Lines as RPC payload.
    pub fn to_new_lines(&self) -> Vec<NewOrderLine> {
        self.items.iter().map(OrderItemDraft::to_new_line).collect()
    }
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self::new()
    }
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity < MIN_ITEM_QUANTITY {
        return Err(CoreError::QuantityBelowMinimum {
            min: MIN_ITEM_QUANTITY,
        });
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Draft Totals
// =============================================================================

/// Draft summary for a front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&OrderDraft> for DraftTotals {
    fn from(draft: &OrderDraft) -> Self {
        DraftTotals {
            item_count: draft.item_count(),
            total_quantity: draft.total_quantity(),
            total: draft.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, cents: i64) -> Product {
        Product {
            id: id.to_string(),
            store_id: "s-1".to_string(),
            category_id: None,
            name: name.to_string(),
            price: Money::from_cents(cents),
            is_active: true,
        }
    }

    #[test]
    fn test_add_same_product_twice_gives_two_lines() {
        let mut draft = OrderDraft::new();
        let taco = product("p-1", "Taco", 2500);

        let a = draft.add_product(&taco).unwrap();
        let b = draft.add_product(&taco).unwrap();

        assert_ne!(a, b);
        assert_eq!(draft.item_count(), 2);
        assert!(draft.items().iter().all(|i| i.quantity == 1));
    }

    #[test]
    fn test_decrement_at_one_is_rejected() {
        let mut draft = OrderDraft::new();
        let uid = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();

        let err = draft.decrement(&uid).unwrap_err();
        assert!(matches!(err, CoreError::QuantityBelowMinimum { min: 1 }));
        assert_eq!(draft.item(&uid).unwrap().quantity, 1);
    }

    #[test]
    fn test_increment_then_decrement() {
        let mut draft = OrderDraft::new();
        let uid = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();

        draft.increment(&uid).unwrap();
        draft.increment(&uid).unwrap();
        draft.decrement(&uid).unwrap();

        assert_eq!(draft.item(&uid).unwrap().quantity, 2);
    }

    #[test]
    fn test_quantity_bounds() {
        let mut draft = OrderDraft::new();
        let uid = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();

        assert!(draft.set_quantity(&uid, 0).is_err());
        assert!(draft.set_quantity(&uid, -3).is_err());
        assert!(matches!(
            draft.set_quantity(&uid, 1000),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        draft.set_quantity(&uid, 999).unwrap();
        assert!(draft.increment(&uid).is_err());
        assert_eq!(draft.item(&uid).unwrap().quantity, 999);
    }

    #[test]
    fn test_total_matches_lines() {
        let mut draft = OrderDraft::new();
        let taco = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();
        let agua = draft.add_line("p-2", "Agua", Money::from_cents(1500)).unwrap();
        draft.set_quantity(&taco, 2).unwrap();
        draft.set_notes(&agua, Some("sin hielo")).unwrap();

        assert_eq!(draft.total().cents(), 6500);
        assert_eq!(draft.total_quantity(), 3);
        assert_eq!(
            draft.item(&agua).unwrap().notes.as_deref(),
            Some("sin hielo")
        );
    }

    #[test]
    fn test_blank_notes_clear() {
        let mut draft = OrderDraft::new();
        let uid = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();
        draft.set_notes(&uid, Some("sin cebolla")).unwrap();
        draft.set_notes(&uid, Some("   ")).unwrap();
        assert_eq!(draft.item(&uid).unwrap().notes, None);
    }

    #[test]
    fn test_price_override() {
        let mut draft = OrderDraft::new();
        let uid = draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();
        draft.set_unit_price(&uid, Money::from_cents(2000)).unwrap();
        assert_eq!(draft.total().cents(), 2000);
        assert!(draft.set_unit_price(&uid, Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_remove_unknown_line() {
        let mut draft = OrderDraft::new();
        assert!(matches!(
            draft.remove_item("nope"),
            Err(CoreError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_draft_full() {
        let mut draft = OrderDraft::new();
        for i in 0..MAX_DRAFT_ITEMS {
            draft
                .add_line(format!("p-{}", i), "Item", Money::from_cents(100))
                .unwrap();
        }
        assert!(matches!(
            draft.add_line("p-x", "Item", Money::from_cents(100)),
            Err(CoreError::DraftFull { .. })
        ));
    }

    #[test]
    fn test_reset() {
        let mut draft = OrderDraft::new();
        draft.set_order_type(OrderType::Takeaway);
        draft.set_customer_name(Some("Ana".to_string()));
        draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();

        draft.reset();

        assert!(draft.is_empty());
        assert_eq!(draft.order_type, OrderType::DineIn);
        assert_eq!(draft.customer_name, None);
    }

    #[test]
    fn test_remove_submitted_keeps_later_lines() {
        let mut draft = OrderDraft::new();
        draft.select_table(Some("t-1".into()));
        draft.add_line("p-1", "Taco", Money::from_cents(2500)).unwrap();
        let submitted = draft.clone();
        let later = draft.add_line("p-2", "Agua", Money::from_cents(1500)).unwrap();

        draft.remove_submitted(&submitted);

        assert_eq!(draft.item_count(), 1);
        assert!(draft.item(&later).is_some());
        assert_eq!(draft.table_id.as_deref(), Some("t-1"));

        let submitted = draft.clone();
        draft.remove_submitted(&submitted);
        assert!(draft.is_empty());
        assert_eq!(draft.table_id, None);
    }

    #[test]
    fn test_new_lines_payload() {
        let mut draft = OrderDraft::new();
        let uid = draft.add_line("p-2", "Agua", Money::from_cents(1500)).unwrap();
        draft.set_notes(&uid, Some(" sin hielo ")).unwrap();

        let lines = draft.to_new_lines();
        assert_eq!(lines[0].product_id, "p-2");
        assert_eq!(lines[0].notes.as_deref(), Some("sin hielo"));

        let json = serde_json::to_value(&lines[0]).unwrap();
        assert_eq!(json["price"], serde_json::json!(15.0));
    }
}
