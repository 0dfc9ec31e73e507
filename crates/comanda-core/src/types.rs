//! # Domain Types
//!
//! Core domain types used throughout Comanda POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  product_name   │       │
//! │  │  category_id    │   │  order_number   │   │  quantity       │       │
//! │  │  name           │   │  order_type     │   │  base_price     │       │
//! │  │  price (Money)  │   │  status         │   │  total_price    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderType     │   │  OrderStatus    │   │  StoreConfig    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  DINE_IN        │   │  OPEN           │   │  printer_name   │       │
//! │  │  TAKEAWAY       │   │  CLOSED         │   │  printer_address│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shapes
//! Every struct here deserializes straight from the backend's JSON rows.
//! Amounts go through [`crate::money::deserialize_decimal`] so a price is
//! integer cents from the moment it enters the process.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{deserialize_decimal, serialize_decimal, Money};

// =============================================================================
// Order Type
// =============================================================================

/// How the order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Served at a table. Requires a table.
    #[default]
    DineIn,
    /// Picked up at the counter. Requires a customer name.
    Takeaway,
}

impl OrderType {
    /// Label printed on the kitchen ticket.
    pub fn ticket_label(&self) -> &'static str {
        match self {
            OrderType::DineIn => "Para aqui",
            OrderType::Takeaway => "Para llevar",
        }
    }

    /// Wire name (`DINE_IN` / `TAKEAWAY`).
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "DINE_IN",
            OrderType::Takeaway => "TAKEAWAY",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of a persisted order.
///
/// ```text
///   create_*_order ──► OPEN ──► add_items_to_order (0..n) ──► close_order ──► CLOSED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Closed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Closed => "CLOSED",
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category (`product_category` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub store_id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Store this product belongs to.
    pub store_id: String,

    /// Category, if the product is filed under one.
    #[serde(default)]
    pub category_id: Option<String>,

    /// Display name shown to staff and on the kitchen ticket.
    pub name: String,

    /// Unit price.
    #[serde(
        deserialize_with = "deserialize_decimal",
        serialize_with = "serialize_decimal"
    )]
    pub price: Money,

    /// Whether product is active (soft delete).
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A physical table in the dining room (`dining_table` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub store_id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Orders
// =============================================================================

/// An order as confirmed by the backend.
///
/// This is the untrusted response the ticket is built from. It is only
/// turned into a [`crate::ticket::PrintOrder`] after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,

    /// Human-facing number printed as "Comanda: <n>".
    pub order_number: i64,

    #[serde(rename = "type")]
    pub order_type: OrderType,

    pub status: OrderStatus,

    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub table_id: Option<String>,

    #[serde(default)]
    pub table_name: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub items: Vec<OrderLine>,
}

impl Order {
    /// Sum of the persisted line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(|line| line.total_price).sum()
    }
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,

    #[serde(default)]
    pub product_id: Option<String>,

    pub product_name: String,

    pub quantity: i64,

    /// Unit price at the time of ordering.
    #[serde(
        deserialize_with = "deserialize_decimal",
        serialize_with = "serialize_decimal"
    )]
    pub base_price: Money,

    /// `base_price × quantity` as stored by the backend.
    #[serde(
        deserialize_with = "deserialize_decimal",
        serialize_with = "serialize_decimal"
    )]
    pub total_price: Money,

    #[serde(default)]
    pub notes: Option<String>,
}

/// One line of an order payload sent to the order RPCs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i64,
    #[serde(
        deserialize_with = "deserialize_decimal",
        serialize_with = "serialize_decimal"
    )]
    pub price: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
}

// =============================================================================
// Store
// =============================================================================

/// The store a user works in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
}

/// Per-store configuration owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub printer_name: Option<String>,
    #[serde(default)]
    pub printer_address: Option<String>,
}

impl StoreConfig {
    /// Printer address, ignoring blank values.
    pub fn printer_address(&self) -> Option<&str> {
        self.printer_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// Role of a member inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    #[default]
    Staff,
}

/// A user attached to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMember {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: MemberRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// Identity
// =============================================================================

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Platform role from the user metadata (not the store role).
    #[serde(default)]
    pub role: Option<String>,
}

impl UserIdentity {
    /// Platform operators can administer every store.
    pub fn is_super_admin(&self) -> bool {
        self.role.as_deref() == Some("super_admin")
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Aggregation window for the sales summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl SummaryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryPeriod::Day => "day",
            SummaryPeriod::Week => "week",
            SummaryPeriod::Month => "month",
            SummaryPeriod::Year => "year",
        }
    }
}

impl std::str::FromStr for SummaryPeriod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(SummaryPeriod::Day),
            "week" => Ok(SummaryPeriod::Week),
            "month" => Ok(SummaryPeriod::Month),
            "year" => Ok(SummaryPeriod::Year),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("unknown period '{}'", other),
            }),
        }
    }
}

/// Sales figures for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_orders: i64,
    #[serde(
        deserialize_with = "deserialize_decimal",
        serialize_with = "serialize_decimal"
    )]
    pub total_revenue: Money,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
}

/// A best seller within a [`SalesSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_name: String,
    pub total_quantity: i64,
    #[serde(
        deserialize_with = "deserialize_decimal",
        serialize_with = "serialize_decimal"
    )]
    pub total_revenue: Money,
}

/// Parameters of a summary request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryQuery {
    pub period: SummaryPeriod,
    pub date: NaiveDate,
}
