//! # Draft Commands
//!
//! Building the order at the point of sale.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────────┐     ┌──────────┐   │
//! │  │  Empty   │────►│  Lines   │────►│ send_to_     │────►│  Empty   │   │
//! │  │  Draft   │     │  added   │     │ kitchen      │     │  Draft   │   │
//! │  └──────────┘     └──────────┘     └──────────────┘     └──────────┘   │
//! │                        │                                                │
//! │                   add_product       set_order_type                     │
//! │                   increment         select_table                       │
//! │                   decrement         set_customer_name                  │
//! │                   set_notes / set_unit_price / remove_item             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use comanda_core::{DraftTotals, Money, OrderDraft, OrderType};

use crate::error::{AppError, AppResult};
use crate::state::{DraftState, SessionState};

/// Draft plus its totals.
#[derive(Debug, Clone, Serialize)]
pub struct DraftResponse {
    pub draft: OrderDraft,
    pub totals: DraftTotals,
}

impl From<&OrderDraft> for DraftResponse {
    fn from(draft: &OrderDraft) -> Self {
        DraftResponse {
            draft: draft.clone(),
            totals: DraftTotals::from(draft),
        }
    }
}

pub fn get_draft(draft: &DraftState) -> DraftResponse {
    debug!("get_draft command");
    draft.with_draft(|d| DraftResponse::from(d))
}

/// Adds a catalog product as a new line, at its current price.
pub async fn add_product(
    draft: &DraftState,
    session: &SessionState,
    product_id: &str,
) -> AppResult<String> {
    debug!(product_id, "add_product command");

    let store_id = session.store_id()?;
    let product = session
        .repos()
        .products(&store_id)
        .find(product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product", product_id))?;
    if !product.is_active {
        return Err(AppError::validation(format!(
            "{} is not available",
            product.name
        )));
    }

    Ok(draft.with_draft_mut(|d| d.add_product(&product))?)
}

pub fn set_quantity(draft: &DraftState, uid: &str, quantity: i64) -> AppResult<DraftResponse> {
    mutate(draft, |d| d.set_quantity(uid, quantity))
}

pub fn increment(draft: &DraftState, uid: &str) -> AppResult<DraftResponse> {
    mutate(draft, |d| d.increment(uid))
}

/// Rejected at quantity 1; removing a line is [`remove_item`].
pub fn decrement(draft: &DraftState, uid: &str) -> AppResult<DraftResponse> {
    mutate(draft, |d| d.decrement(uid))
}

pub fn set_notes(draft: &DraftState, uid: &str, notes: Option<&str>) -> AppResult<DraftResponse> {
    mutate(draft, |d| d.set_notes(uid, notes))
}

pub fn set_unit_price(draft: &DraftState, uid: &str, price: Money) -> AppResult<DraftResponse> {
    mutate(draft, |d| d.set_unit_price(uid, price))
}

pub fn remove_item(draft: &DraftState, uid: &str) -> AppResult<DraftResponse> {
    mutate(draft, |d| d.remove_item(uid))
}

pub fn set_order_type(draft: &DraftState, order_type: OrderType) -> DraftResponse {
    draft.with_draft_mut(|d| {
        d.set_order_type(order_type);
        DraftResponse::from(&*d)
    })
}

pub fn select_table(draft: &DraftState, table_id: Option<String>) -> DraftResponse {
    draft.with_draft_mut(|d| {
        d.select_table(table_id);
        DraftResponse::from(&*d)
    })
}

pub fn set_customer_name(draft: &DraftState, name: Option<String>) -> DraftResponse {
    draft.with_draft_mut(|d| {
        d.set_customer_name(name);
        DraftResponse::from(&*d)
    })
}

pub fn clear_draft(draft: &DraftState) -> DraftResponse {
    debug!("clear_draft command");
    draft.with_draft_mut(|d| {
        d.clear();
        DraftResponse::from(&*d)
    })
}

fn mutate<F>(draft: &DraftState, f: F) -> AppResult<DraftResponse>
where
    F: FnOnce(&mut OrderDraft) -> comanda_core::CoreResult<()>,
{
    draft.with_draft_mut(|d| {
        f(d)?;
        Ok(DraftResponse::from(&*d))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn draft_with_taco() -> (DraftState, String) {
        let draft = DraftState::new();
        let uid = draft
            .with_draft_mut(|d| d.add_line("p-1", "Taco", Money::from_cents(2500)))
            .unwrap();
        (draft, uid)
    }

    #[test]
    fn test_decrement_at_one_rejected() {
        let (draft, uid) = draft_with_taco();

        let err = decrement(&draft, &uid).unwrap_err();

        assert_eq!(err.code, ErrorCode::DraftError);
        assert_eq!(get_draft(&draft).draft.items()[0].quantity, 1);
    }

    #[test]
    fn test_totals_follow_mutations() {
        let (draft, uid) = draft_with_taco();
        increment(&draft, &uid).unwrap();
        let agua = draft
            .with_draft_mut(|d| d.add_line("p-2", "Agua", Money::from_cents(1500)))
            .unwrap();

        let response = set_notes(&draft, &agua, Some("sin hielo")).unwrap();

        assert_eq!(response.totals.total, Money::from_cents(6500));
        assert_eq!(response.totals.total_quantity, 3);
    }

    #[test]
    fn test_unknown_line() {
        let (draft, _) = draft_with_taco();
        assert_eq!(remove_item(&draft, "nope").unwrap_err().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_clear_keeps_header() {
        let (draft, _) = draft_with_taco();
        select_table(&draft, Some("t-1".into()));

        let response = clear_draft(&draft);

        assert!(response.draft.is_empty());
        assert_eq!(response.draft.table_id.as_deref(), Some("t-1"));
    }
}
