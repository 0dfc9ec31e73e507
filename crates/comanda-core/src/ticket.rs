//! # Kitchen Ticket Snapshot
//!
//! `PrintOrder` is what gets printed. It is built exactly once from a
//! response the backend has already confirmed, validated on the way in, and
//! never mutated afterwards.
//!
//! ```text
//! ┌──────────────┐   create_*_order    ┌──────────────┐  from_confirmed  ┌─────────────┐
//! │ OrderDraft   │ ──────────────────► │ Order (JSON) │ ───────────────► │ PrintOrder  │
//! │ (mutable)    │                     │ (untrusted)  │   validates      │ (immutable) │
//! └──────────────┘                     └──────────────┘                  └─────────────┘
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Order, OrderLine, OrderType};
use crate::{MAX_ITEM_QUANTITY, MIN_ITEM_QUANTITY};

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintItem {
    name: String,
    quantity: i64,
    price: Money,
    notes: Option<String>,
    line_total: Money,
}

impl PrintItem {
    /// Builds a line, rejecting what a kitchen cannot act on.
    pub fn new(
        name: impl Into<String>,
        quantity: i64,
        price: Money,
        notes: Option<String>,
    ) -> CoreResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::invalid_order("item without a name"));
        }
        if !(MIN_ITEM_QUANTITY..=MAX_ITEM_QUANTITY).contains(&quantity) {
            return Err(CoreError::invalid_order(format!(
                "item '{}' has quantity {}",
                name, quantity
            )));
        }
        if price.is_negative() {
            return Err(CoreError::invalid_order(format!(
                "item '{}' has a negative price",
                name
            )));
        }
        let line_total = price.checked_mul(quantity).ok_or_else(|| {
            CoreError::invalid_order(format!("item '{}' total is out of range", name))
        })?;
        Ok(PrintItem {
            name,
            quantity,
            price,
            notes: notes.filter(|n| !n.trim().is_empty()),
            line_total,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Unit price.
    pub fn price(&self) -> Money {
        self.price
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }
}

impl TryFrom<&OrderLine> for PrintItem {
    type Error = CoreError;

    fn try_from(line: &OrderLine) -> CoreResult<Self> {
        PrintItem::new(
            line.product_name.clone(),
            line.quantity,
            line.base_price,
            line.notes.clone(),
        )
    }
}

/// Immutable snapshot of a confirmed order, ready for the composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintOrder {
    order_number: String,
    order_type: OrderType,
    customer_name: Option<String>,
    table_name: Option<String>,
    items: Vec<PrintItem>,
    total: Money,
}

impl PrintOrder {
    /// Validates and freezes a ticket.
    ///
    /// ## Rules
    /// - order number not blank
    /// - at least one item
    /// - dine-in needs a table name, takeaway needs a customer name
    /// - the total fits in `Money`
    pub fn new(
        order_number: impl Into<String>,
        order_type: OrderType,
        customer_name: Option<String>,
        table_name: Option<String>,
        items: Vec<PrintItem>,
    ) -> CoreResult<Self> {
        let order_number = order_number.into();
        if order_number.trim().is_empty() {
            return Err(CoreError::invalid_order("missing order number"));
        }
        if items.is_empty() {
            return Err(CoreError::invalid_order("order has no items"));
        }

        let customer_name = customer_name.filter(|n| !n.trim().is_empty());
        let table_name = table_name.filter(|n| !n.trim().is_empty());

        match order_type {
            OrderType::DineIn if table_name.is_none() => {
                return Err(CoreError::invalid_order("dine-in order without a table"));
            }
            OrderType::Takeaway if customer_name.is_none() => {
                return Err(CoreError::invalid_order(
                    "takeaway order without a customer name",
                ));
            }
            _ => {}
        }

        let total = items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()))
            .ok_or_else(|| CoreError::invalid_order("order total is out of range"))?;

        Ok(PrintOrder {
            order_number,
            order_type,
            customer_name,
            table_name,
            items,
            total,
        })
    }

    /// Builds the ticket for a freshly confirmed order.
    pub fn from_confirmed(order: &Order) -> CoreResult<Self> {
        let items = order
            .items
            .iter()
            .map(PrintItem::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        Self::from_order_with_items(order, items)
    }

    /// Builds a ticket for lines appended to an open order. Only the new
    /// lines are printed; the header comes from the order.
    pub fn for_added_items(order: &Order, added: &[OrderLine]) -> CoreResult<Self> {
        let items = added
            .iter()
            .map(PrintItem::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        Self::from_order_with_items(order, items)
    }

    fn from_order_with_items(order: &Order, items: Vec<PrintItem>) -> CoreResult<Self> {
        PrintOrder::new(
            order.order_number.to_string(),
            order.order_type,
            order.customer_name.clone(),
            order.table_name.clone(),
            items,
        )
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn items(&self) -> &[PrintItem] {
        &self.items
    }

    /// Σ price × quantity.
    pub fn total(&self) -> Money {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use chrono::Utc;

    fn line(name: &str, qty: i64, cents: i64, notes: Option<&str>) -> OrderLine {
        OrderLine {
            id: format!("l-{}", name),
            product_id: None,
            product_name: name.to_string(),
            quantity: qty,
            base_price: Money::from_cents(cents),
            total_price: Money::from_cents(cents * qty),
            notes: notes.map(str::to_string),
        }
    }

    fn order(order_type: OrderType, items: Vec<OrderLine>) -> Order {
        Order {
            id: "o-1".to_string(),
            order_number: 17,
            order_type,
            status: OrderStatus::Open,
            customer_name: Some("Ana".to_string()),
            table_id: Some("t-1".to_string()),
            table_name: Some("Mesa 3".to_string()),
            created_at: Utc::now(),
            items,
        }
    }

    #[test]
    fn test_from_confirmed() {
        let o = order(
            OrderType::DineIn,
            vec![
                line("Taco", 2, 2500, None),
                line("Agua", 1, 1500, Some("sin hielo")),
            ],
        );
        let ticket = PrintOrder::from_confirmed(&o).unwrap();

        assert_eq!(ticket.order_number(), "17");
        assert_eq!(ticket.table_name(), Some("Mesa 3"));
        assert_eq!(ticket.items().len(), 2);
        assert_eq!(ticket.items()[1].notes(), Some("sin hielo"));
        assert_eq!(ticket.total().to_decimal_string(), "65.00");
    }

    #[test]
    fn test_rejects_empty_order() {
        let o = order(OrderType::DineIn, vec![]);
        assert!(matches!(
            PrintOrder::from_confirmed(&o),
            Err(CoreError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_lines() {
        let o = order(OrderType::DineIn, vec![line("Taco", 0, 2500, None)]);
        assert!(PrintOrder::from_confirmed(&o).is_err());

        let o = order(OrderType::DineIn, vec![line("Taco", 1, -1, None)]);
        assert!(PrintOrder::from_confirmed(&o).is_err());
    }

    #[test]
    fn test_rejects_quantity_above_draft_limit() {
        let o = order(OrderType::DineIn, vec![line("Taco", 1000, 2500, None)]);
        assert!(matches!(
            PrintOrder::from_confirmed(&o),
            Err(CoreError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_overflowing_amounts_are_rejected() {
        let err = PrintItem::new("Taco", 10_000_000_000_000, Money::from_cents(100_000_000), None);
        assert!(matches!(err, Err(CoreError::InvalidOrder { .. })));

        let huge = PrintItem::new("Taco", 999, Money::from_cents(i64::MAX / 500), None);
        assert!(matches!(huge, Err(CoreError::InvalidOrder { .. })));

        let half = Money::from_cents(i64::MAX / 2 + 1);
        let items = vec![
            PrintItem::new("Taco", 1, half, None).unwrap(),
            PrintItem::new("Agua", 1, half, None).unwrap(),
        ];
        let total = PrintOrder::new("17", OrderType::Takeaway, Some("Ana".into()), None, items);
        assert!(matches!(total, Err(CoreError::InvalidOrder { .. })));
    }

    #[test]
    fn test_header_requirements() {
        let mut o = order(OrderType::Takeaway, vec![line("Taco", 1, 2500, None)]);
        o.customer_name = Some("   ".to_string());
        assert!(PrintOrder::from_confirmed(&o).is_err());

        let mut o = order(OrderType::DineIn, vec![line("Taco", 1, 2500, None)]);
        o.table_name = None;
        assert!(PrintOrder::from_confirmed(&o).is_err());
    }

    #[test]
    fn test_added_items_only() {
        let o = order(
            OrderType::DineIn,
            vec![line("Taco", 2, 2500, None), line("Agua", 1, 1500, None)],
        );
        let added = vec![line("Flan", 1, 3000, None)];
        let ticket = PrintOrder::for_added_items(&o, &added).unwrap();

        assert_eq!(ticket.items().len(), 1);
        assert_eq!(ticket.items()[0].name(), "Flan");
        assert_eq!(ticket.total().cents(), 3000);
    }
}
