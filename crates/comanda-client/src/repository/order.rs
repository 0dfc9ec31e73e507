//! # Order Repository
//!
//! Orders are read from the `order_detail` view (order row + table name +
//! lines as JSON) and written only through stored procedures, which number
//! the order and price the lines in one transaction.
//!
//! ## Procedures
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_dine_in_order  (p_store_id, p_table_id, p_items)      → Order   │
//! │  create_takeaway_order (p_store_id, p_customer_name, p_items) → Order   │
//! │  add_items_to_order    (p_order_id, p_items)                  → lines   │
//! │  close_order           (p_order_id, p_table_id)               → void    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Responses are checked before they are handed out: a confirmed order must
//! have the requested type and carry at least one line.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use comanda_core::validation::validate_name;
use comanda_core::{NewOrderLine, Order, OrderLine, OrderStatus, OrderType, ValidationError};

use crate::cache::{Entity, QueryCache, QueryKey};
use crate::error::{ClientError, ClientResult};
use crate::rest::{Query, RestClient};

const ORDER_VIEW: &str = "order_detail";

#[derive(Serialize)]
struct CreateDineIn<'a> {
    p_store_id: &'a str,
    p_table_id: &'a str,
    p_items: &'a [NewOrderLine],
}

#[derive(Serialize)]
struct CreateTakeaway<'a> {
    p_store_id: &'a str,
    p_customer_name: &'a str,
    p_items: &'a [NewOrderLine],
}

#[derive(Serialize)]
struct AddItems<'a> {
    p_order_id: &'a str,
    p_items: &'a [NewOrderLine],
}

#[derive(Serialize)]
struct CloseOrder<'a> {
    p_order_id: &'a str,
    p_table_id: Option<&'a str>,
}

#[derive(Clone)]
pub struct OrderRepository {
    rest: Arc<RestClient>,
    cache: Arc<QueryCache>,
    store_id: String,
}

impl OrderRepository {
    pub fn new(rest: Arc<RestClient>, cache: Arc<QueryCache>, store_id: &str) -> Self {
        OrderRepository {
            rest,
            cache,
            store_id: store_id.to_string(),
        }
    }

    /// Newest first, optionally only one status.
    pub async fn list(&self, status: Option<OrderStatus>) -> ClientResult<Vec<Order>> {
        let scope = status.map(|s| s.as_str()).unwrap_or("all");
        let key = QueryKey::new(Entity::Orders, &self.store_id, scope);

        self.cache
            .get_or_fetch(key, || async {
                let mut query = Query::new().select("*").eq("store_id", &self.store_id);
                if let Some(status) = status {
                    query = query.eq("status", status.as_str());
                }
                self.rest
                    .select(ORDER_VIEW, &query.order("created_at", false))
                    .await
            })
            .await
    }

    /// Always fetched fresh; used right before printing.
    pub async fn get(&self, id: &str) -> ClientResult<Order> {
        let query = Query::new()
            .select("*")
            .eq("id", id)
            .eq("store_id", &self.store_id);

        self.rest
            .select_one(ORDER_VIEW, &query)
            .await?
            .ok_or_else(|| ClientError::NotFound {
                entity: "order".to_string(),
                id: id.to_string(),
            })
    }

    pub async fn create_dine_in(
        &self,
        table_id: &str,
        items: &[NewOrderLine],
    ) -> ClientResult<Order> {
        require_items(items)?;
        if table_id.trim().is_empty() {
            return Err(ValidationError::required("table").into());
        }

        let order: Order = self
            .rest
            .rpc(
                "create_dine_in_order",
                &CreateDineIn {
                    p_store_id: &self.store_id,
                    p_table_id: table_id,
                    p_items: items,
                },
            )
            .await?;

        self.confirmed(order, OrderType::DineIn)
    }

    pub async fn create_takeaway(
        &self,
        customer_name: &str,
        items: &[NewOrderLine],
    ) -> ClientResult<Order> {
        require_items(items)?;
        let customer_name = validate_name("customer name", customer_name)?;

        let order: Order = self
            .rest
            .rpc(
                "create_takeaway_order",
                &CreateTakeaway {
                    p_store_id: &self.store_id,
                    p_customer_name: &customer_name,
                    p_items: items,
                },
            )
            .await?;

        self.confirmed(order, OrderType::Takeaway)
    }

    /// Appends lines to an open order; returns only the new lines.
    pub async fn add_items(
        &self,
        order_id: &str,
        items: &[NewOrderLine],
    ) -> ClientResult<Vec<OrderLine>> {
        require_items(items)?;

        let added: Vec<OrderLine> = self
            .rest
            .rpc(
                "add_items_to_order",
                &AddItems {
                    p_order_id: order_id,
                    p_items: items,
                },
            )
            .await?;

        if added.len() != items.len() {
            return Err(ClientError::InvalidResponse(format!(
                "add_items_to_order returned {} lines for {} items",
                added.len(),
                items.len()
            )));
        }

        self.invalidate_sales();
        info!(store_id = %self.store_id, order_id, lines = added.len(), "Items added to order");
        Ok(added)
    }

    /// Closes an order and frees its table.
    pub async fn close(&self, order_id: &str, table_id: Option<&str>) -> ClientResult<()> {
        self.rest
            .rpc_unit(
                "close_order",
                &CloseOrder {
                    p_order_id: order_id,
                    p_table_id: table_id,
                },
            )
            .await?;

        self.invalidate_sales();
        info!(store_id = %self.store_id, order_id, "Order closed");
        Ok(())
    }

    fn confirmed(&self, order: Order, expected: OrderType) -> ClientResult<Order> {
        check_confirmed(&order, expected)?;
        self.invalidate_sales();
        info!(
            store_id = %self.store_id,
            order_number = order.order_number,
            order_type = %order.order_type,
            total = %order.total(),
            "Order created"
        );
        Ok(order)
    }

    fn invalidate_sales(&self) {
        self.cache.invalidate(Entity::Orders, &self.store_id);
        self.cache.invalidate(Entity::Summary, &self.store_id);
    }
}

fn require_items(items: &[NewOrderLine]) -> ClientResult<()> {
    if items.is_empty() {
        return Err(ValidationError::EmptyOrder.into());
    }
    Ok(())
}

fn check_confirmed(order: &Order, expected: OrderType) -> ClientResult<()> {
    if order.order_type != expected {
        return Err(ClientError::InvalidResponse(format!(
            "expected a {} order, backend returned {}",
            expected, order.order_type
        )));
    }
    if order.items.is_empty() {
        return Err(ClientError::InvalidResponse(format!(
            "order {} came back without lines",
            order.order_number
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::Money;
    use serde_json::json;

    fn confirmed_order(order_type: &str, with_items: bool) -> Order {
        let items = if with_items {
            json!([{
                "id": "l-1",
                "product_id": "p-1",
                "product_name": "Taco",
                "quantity": 2,
                "base_price": 25,
                "total_price": "50.00"
            }])
        } else {
            json!([])
        };
        serde_json::from_value(json!({
            "id": "o-1",
            "order_number": 7,
            "type": order_type,
            "status": "OPEN",
            "customer_name": "Ana",
            "created_at": "2024-05-01T12:00:00Z",
            "items": items
        }))
        .unwrap()
    }

    #[test]
    fn test_confirmed_order_checks() {
        assert!(check_confirmed(&confirmed_order("TAKEAWAY", true), OrderType::Takeaway).is_ok());

        let wrong_type = check_confirmed(&confirmed_order("DINE_IN", true), OrderType::Takeaway);
        assert!(matches!(wrong_type, Err(ClientError::InvalidResponse(_))));

        let empty = check_confirmed(&confirmed_order("TAKEAWAY", false), OrderType::Takeaway);
        assert!(matches!(empty, Err(ClientError::InvalidResponse(_))));
    }

    #[test]
    fn test_rpc_payload_shape() {
        let items = vec![NewOrderLine {
            product_id: "p-1".into(),
            quantity: 2,
            price: Money::from_cents(2500),
            notes: None,
        }];
        let body = serde_json::to_value(CreateTakeaway {
            p_store_id: "s-1",
            p_customer_name: "Ana",
            p_items: &items,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "p_store_id": "s-1",
                "p_customer_name": "Ana",
                "p_items": [{ "product_id": "p-1", "quantity": 2, "price": 25.0 }]
            })
        );
    }

    #[test]
    fn test_empty_items_rejected() {
        assert!(matches!(
            require_items(&[]),
            Err(ClientError::Core(_))
        ));
    }
}
