//! # Order Commands
//!
//! Sending the draft to the kitchen, appending to open orders, reprinting.
//!
//! ## Send to Kitchen
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     send_to_kitchen()                                   │
//! │                                                                         │
//! │  0. Claim the draft ─── submission in flight ──────────► Err           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. Validate locally ─── empty / no table / blank name ──► Err (nothing │
//! │        │                 no store / no printer address      happened)  │
//! │        ▼                                                                │
//! │  2. create_dine_in_order | create_takeaway_order (RPC) ──► Err          │
//! │        │ persisted                                                      │
//! │        ▼                                                                │
//! │  3. Remove the submitted lines from the draft                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  4. Dine-in row without its table name ──► re-read from order_detail   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  5. PrintOrder::from_confirmed ──► PrinterHandle::print                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  SubmitOutcome { order, printed, print_error }                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The draft is only ever read through a snapshot while the RPC is in
//! flight, so lines added meanwhile survive the submission.
//!
//! Once the order is persisted the command succeeds. A ticket that fails to
//! print is reported in the outcome and can be reprinted; the order is never
//! rolled back.

use serde::Serialize;
use tracing::{debug, info, warn};

use comanda_core::validation::{validate_append, validate_submission};
use comanda_client::repository::OrderRepository;
use comanda_core::{Order, OrderStatus, OrderType, PrintOrder, ValidationError};
use comanda_print::PrintOutcome;

use crate::error::{AppError, AppResult};
use crate::state::{ConfigState, DraftState, PrinterState, SessionState};

/// What happened to a submitted order and its ticket.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub order: Order,
    pub printed: bool,
    pub print_error: Option<String>,
}

impl SubmitOutcome {
    fn new(order: Order, outcome: PrintOutcome) -> Self {
        SubmitOutcome {
            order,
            printed: outcome.success,
            print_error: outcome.error,
        }
    }
}

/// Persists the draft as a new order and prints its kitchen ticket.
pub async fn send_to_kitchen(
    draft: &DraftState,
    session: &SessionState,
    printer: &PrinterState,
    config: &ConfigState,
) -> AppResult<SubmitOutcome> {
    debug!("send_to_kitchen command");

    let guard = draft.begin_submission()?;
    let snapshot = draft.snapshot();
    validate_submission(&snapshot)?;
    let store_id = session.store_id()?;
    let address = printer_address(session, printer, config, &store_id).await?;

    let items = snapshot.to_new_lines();
    let orders = session.repos().orders(&store_id);
    let order = match snapshot.order_type {
        OrderType::DineIn => {
            let table_id = snapshot.table_id.as_deref().unwrap_or_default();
            orders.create_dine_in(table_id, &items).await?
        }
        OrderType::Takeaway => {
            let customer = snapshot.customer_name.as_deref().unwrap_or_default();
            orders.create_takeaway(customer, &items).await?
        }
    };

    draft.complete_submission(&guard, &snapshot);
    drop(guard);
    info!(
        order_number = order.order_number,
        order_type = %order.order_type,
        total = %order.total(),
        "Order sent to kitchen"
    );

    let order = with_table_name(&orders, order).await;

    let outcome = print_confirmed(printer, PrintOrder::from_confirmed(&order), &address).await;
    Ok(SubmitOutcome::new(order, outcome))
}

/// Adds the draft's lines to an open order and prints only those lines.
pub async fn append_to_open_order(
    draft: &DraftState,
    session: &SessionState,
    printer: &PrinterState,
    config: &ConfigState,
    order_id: &str,
) -> AppResult<SubmitOutcome> {
    debug!(order_id, "append_to_open_order command");

    let guard = draft.begin_submission()?;
    let snapshot = draft.snapshot();
    validate_append(&snapshot)?;
    let store_id = session.store_id()?;
    let address = printer_address(session, printer, config, &store_id).await?;

    let orders = session.repos().orders(&store_id);
    let mut order = orders.get(order_id).await?;
    if order.status != OrderStatus::Open {
        return Err(AppError::validation(format!(
            "Order {} is already closed",
            order.order_number
        )));
    }

    let added = orders.add_items(order_id, &snapshot.to_new_lines()).await?;
    draft.complete_submission(&guard, &snapshot);
    drop(guard);
    info!(order_number = order.order_number, lines = added.len(), "Items appended to order");

    let ticket = PrintOrder::for_added_items(&order, &added);
    let outcome = print_confirmed(printer, ticket, &address).await;

    order.items.extend(added);
    Ok(SubmitOutcome::new(order, outcome))
}

/// Prints an existing order again, as the backend has it now.
pub async fn reprint_order(
    session: &SessionState,
    printer: &PrinterState,
    config: &ConfigState,
    order_id: &str,
) -> AppResult<PrintOutcome> {
    debug!(order_id, "reprint_order command");

    let store_id = session.store_id()?;
    let address = printer_address(session, printer, config, &store_id).await?;
    let order = session.repos().orders(&store_id).get(order_id).await?;

    let ticket = PrintOrder::from_confirmed(&order)?;
    Ok(printer.print(&ticket, &address).await)
}

pub async fn list_orders(
    session: &SessionState,
    status: Option<OrderStatus>,
) -> AppResult<Vec<Order>> {
    debug!(?status, "list_orders command");
    let store_id = session.store_id()?;
    Ok(session.repos().orders(&store_id).list(status).await?)
}

pub async fn get_order(session: &SessionState, order_id: &str) -> AppResult<Order> {
    let store_id = session.store_id()?;
    Ok(session.repos().orders(&store_id).get(order_id).await?)
}

/// Closes an order and frees its table.
pub async fn close_order(session: &SessionState, order_id: &str) -> AppResult<()> {
    debug!(order_id, "close_order command");

    let store_id = session.store_id()?;
    let orders = session.repos().orders(&store_id);
    let order = orders.get(order_id).await?;
    if order.status == OrderStatus::Closed {
        return Err(AppError::validation(format!(
            "Order {} is already closed",
            order.order_number
        )));
    }

    orders.close(&order.id, order.table_id.as_deref()).await?;
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Printer for this store, see [`crate::state::printer`] for the order.
pub(crate) async fn printer_address(
    session: &SessionState,
    printer: &PrinterState,
    config: &ConfigState,
    store_id: &str,
) -> AppResult<String> {
    if let Some(address) = printer.remembered_address() {
        return Ok(address);
    }

    let store = session.repos().store().get_config(store_id).await?;
    if let Some(address) = store.printer_address() {
        return Ok(address.to_string());
    }

    config
        .config
        .printer_address()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::required("printer address").into())
}

/// The create RPCs may answer with the bare order row. A dine-in ticket
/// needs its table name, which only the detail view carries.
async fn with_table_name(orders: &OrderRepository, order: Order) -> Order {
    let has_name = order
        .table_name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if order.order_type != OrderType::DineIn || has_name {
        return order;
    }

    match orders.get(&order.id).await {
        Ok(detail) => detail,
        Err(e) => {
            warn!(order_id = %order.id, error = %e, "Could not re-read order for its table name");
            order
        }
    }
}

async fn print_confirmed(
    printer: &PrinterState,
    ticket: comanda_core::CoreResult<PrintOrder>,
    address: &str,
) -> PrintOutcome {
    match ticket {
        Ok(ticket) => printer.print(&ticket, address).await,
        Err(e) => {
            warn!(error = %e, "Confirmed order cannot be printed");
            PrintOutcome {
                success: false,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{cache_store_config, online_app, test_app, FakeBackend, TestApp};
    use comanda_core::{Money, OrderDraft};
    use comanda_print::{Op, RecordingTransport};
    use std::time::Duration;

    fn add_taco(draft: &DraftState) {
        draft
            .with_draft_mut(|d| d.add_line("p-1", "Taco", Money::from_cents(2500)))
            .unwrap();
    }

    async fn rejected(app: &crate::testing::TestApp) -> AppError {
        let state = &app.state;
        send_to_kitchen(&state.draft, &state.session, &state.printer, &state.config)
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_empty_draft_rejected_before_anything() {
        let app = test_app().await;
        cache_store_config(&app.state, Some("COM5"));

        let err = rejected(&app).await;

        assert!(err.is_validation());
        assert_eq!(err.message, "Order has no items");
        assert!(app.printer_log.ops().is_empty());
    }

    #[tokio::test]
    async fn test_dine_in_without_table_rejected() {
        let app = test_app().await;
        cache_store_config(&app.state, Some("COM5"));
        add_taco(&app.state.draft);

        let err = rejected(&app).await;

        assert!(err.is_validation());
        assert_eq!(err.message, "table is required");
        assert_eq!(app.state.draft.snapshot().item_count(), 1);
        assert!(app.printer_log.ops().is_empty());
    }

    #[tokio::test]
    async fn test_takeaway_blank_name_rejected() {
        let app = test_app().await;
        cache_store_config(&app.state, Some("COM5"));
        add_taco(&app.state.draft);
        app.state.draft.with_draft_mut(|d| {
            d.set_order_type(OrderType::Takeaway);
            d.set_customer_name(Some("   ".into()));
        });

        let err = rejected(&app).await;

        assert!(err.is_validation());
        assert!(app.printer_log.ops().is_empty());
    }

    #[tokio::test]
    async fn test_missing_store_rejected() {
        let app = test_app().await;
        add_taco(&app.state.draft);
        app.state.draft.with_draft_mut(|d| d.select_table(Some("t-1".into())));
        app.state.session.set_store(None);

        let err = rejected(&app).await;

        assert_eq!(err.message, "store is required");
    }

    #[tokio::test]
    async fn test_missing_printer_rejected() {
        let app = test_app().await;
        cache_store_config(&app.state, None);
        add_taco(&app.state.draft);
        app.state.draft.with_draft_mut(|d| d.select_table(Some("t-1".into())));

        let err = rejected(&app).await;

        assert!(err.is_validation());
        assert_eq!(err.message, "printer address is required");
        assert_eq!(app.state.draft.snapshot().item_count(), 1);
        assert!(app.printer_log.ops().is_empty());
    }

    #[tokio::test]
    async fn test_printer_address_resolution_order() {
        let app = test_app().await;
        let state = &app.state;
        cache_store_config(state, Some("/dev/rfcomm0"));

        let from_store = printer_address(&state.session, &state.printer, &state.config, "s-1")
            .await
            .unwrap();
        assert_eq!(from_store, "/dev/rfcomm0");

        state.printer.remember("COM7").unwrap();
        let remembered = printer_address(&state.session, &state.printer, &state.config, "s-1")
            .await
            .unwrap();
        assert_eq!(remembered, "COM7");
    }

    #[tokio::test]
    async fn test_append_requires_lines() {
        let app = test_app().await;
        let state = &app.state;

        let err = append_to_open_order(&state.draft, &state.session, &state.printer, &state.config, "o-1")
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(app.printer_log.ops().is_empty());
    }

    #[tokio::test]
    async fn test_unprintable_order_reported_not_raised() {
        let app = test_app().await;
        let outcome = print_confirmed(
            &app.state.printer,
            Err(comanda_core::CoreError::invalid_order("order has no items")),
            "COM5",
        )
        .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("order has no items"));
        assert!(app.printer_log.ops().is_empty());
    }

    // -------------------------------------------------------------------------
    // Against the backend
    // -------------------------------------------------------------------------

    /// Table t-1: 2 × Taco at 25.00, 1 × Agua at 15.00 "sin hielo".
    fn fill_dine_in(draft: &DraftState) {
        draft
            .with_draft_mut(|d| {
                d.select_table(Some("t-1".into()));
                let taco = d.add_line("p-1", "Taco", Money::from_cents(2500))?;
                d.increment(&taco)?;
                let agua = d.add_line("p-2", "Agua", Money::from_cents(1500))?;
                d.set_notes(&agua, Some("sin hielo"))
            })
            .unwrap();
    }

    async fn send(app: &TestApp) -> AppResult<SubmitOutcome> {
        let state = &app.state;
        send_to_kitchen(&state.draft, &state.session, &state.printer, &state.config).await
    }

    #[tokio::test]
    async fn test_send_to_kitchen_prints_saved_order() {
        let backend = FakeBackend::new();
        let app = online_app(&backend, RecordingTransport::new()).await;
        fill_dine_in(&app.state.draft);

        let outcome = send(&app).await.unwrap();

        assert!(outcome.printed, "{:?}", outcome.print_error);
        assert_eq!(outcome.order.total(), Money::from_cents(6500));
        assert!(app.state.draft.with_draft(OrderDraft::is_empty));
        assert_eq!(backend.orders().len(), 1);

        assert!(app.printer_log.ops().contains(&Op::Connect("COM5".into())));
        let lines = app.printer_log.printed_lines();
        assert!(lines.contains(&"Comanda: 1".to_string()));
        assert!(lines.contains(&"Mesa: Mesa 3".to_string()));
        let agua = lines.iter().position(|l| l.starts_with("Agua")).unwrap();
        assert_eq!(lines[agua + 1], "  - sin hielo");
        let total = lines.iter().find(|l| l.starts_with("TOTAL")).unwrap();
        assert!(total.ends_with(" 65.00"), "{total}");

        let rpc = backend
            .requests()
            .into_iter()
            .find(|r| r.path == "rpc/create_dine_in_order")
            .unwrap();
        assert_eq!(rpc.apikey.as_deref(), Some("anon"));
        assert_eq!(rpc.authorization.as_deref(), Some("Bearer access-0"));
    }

    #[tokio::test]
    async fn test_bare_dine_in_row_is_reread_for_table_name() {
        let backend = FakeBackend::new().with_bare_rows();
        let app = online_app(&backend, RecordingTransport::new()).await;
        fill_dine_in(&app.state.draft);

        let outcome = send(&app).await.unwrap();

        assert!(outcome.printed, "{:?}", outcome.print_error);
        assert_eq!(outcome.order.table_name.as_deref(), Some("Mesa 3"));
        assert!(backend.requests().iter().any(|r| r.path == "order_detail"));
        assert!(app
            .printer_log
            .printed_lines()
            .contains(&"Mesa: Mesa 3".to_string()));
    }

    #[tokio::test]
    async fn test_print_failure_keeps_order_and_forgets_printer() {
        let backend = FakeBackend::new();
        let mut transport = RecordingTransport::new();
        transport.fail_on_op(1);
        let app = online_app(&backend, transport).await;
        app.state.printer.remember("COM7").unwrap();
        fill_dine_in(&app.state.draft);

        let outcome = send(&app).await.unwrap();

        assert!(!outcome.printed);
        assert!(outcome.print_error.is_some());
        assert_eq!(backend.orders().len(), 1);
        assert!(app.state.draft.with_draft(OrderDraft::is_empty));
        assert!(app.printer_log.ops().contains(&Op::Connect("COM7".into())));
        assert!(app.state.printer.remembered_address().is_none());
    }

    #[tokio::test]
    async fn test_append_prints_only_added_lines() {
        let backend = FakeBackend::new();
        let app = online_app(&backend, RecordingTransport::new()).await;
        let state = &app.state;
        fill_dine_in(&state.draft);
        let created = send(&app).await.unwrap();
        let printed_before = app.printer_log.printed_lines().len();

        state
            .draft
            .with_draft_mut(|d| d.add_line("p-3", "Flan", Money::from_cents(1200)))
            .unwrap();
        let outcome = append_to_open_order(
            &state.draft,
            &state.session,
            &state.printer,
            &state.config,
            &created.order.id,
        )
        .await
        .unwrap();

        assert!(outcome.printed, "{:?}", outcome.print_error);
        assert_eq!(outcome.order.items.len(), 3);
        assert_eq!(backend.orders()[0].items.len(), 3);
        assert!(state.draft.with_draft(OrderDraft::is_empty));

        let appended = &app.printer_log.printed_lines()[printed_before..];
        assert!(appended.iter().any(|l| l.starts_with("Flan")));
        assert!(!appended.iter().any(|l| l.starts_with("Taco")));
        let total = appended.iter().find(|l| l.starts_with("TOTAL")).unwrap();
        assert!(total.ends_with(" 12.00"), "{total}");
    }

    #[tokio::test]
    async fn test_reprint_reads_order_back() {
        let backend = FakeBackend::new();
        let app = online_app(&backend, RecordingTransport::new()).await;
        let state = &app.state;
        fill_dine_in(&state.draft);
        let created = send(&app).await.unwrap();

        let outcome = reprint_order(&state.session, &state.printer, &state.config, &created.order.id)
            .await
            .unwrap();

        assert!(outcome.success);
        let lines = app.printer_log.printed_lines();
        assert_eq!(lines.iter().filter(|l| *l == "Comanda: 1").count(), 2);
    }

    #[tokio::test]
    async fn test_double_submit_creates_one_order() {
        let backend = FakeBackend::new().with_rpc_delay(100);
        let app = online_app(&backend, RecordingTransport::new()).await;
        fill_dine_in(&app.state.draft);

        let (first, second) = tokio::join!(send(&app), send(&app));

        let (sent, refused): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(Result::is_ok);
        assert_eq!(sent.len(), 1);
        let err = refused.into_iter().next().unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::DraftError);
        assert_eq!(backend.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_line_added_during_submission_is_kept() {
        let backend = FakeBackend::new().with_rpc_delay(200);
        let app = online_app(&backend, RecordingTransport::new()).await;
        fill_dine_in(&app.state.draft);

        let add_flan = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            app.state
                .draft
                .with_draft_mut(|d| d.add_line("p-3", "Flan", Money::from_cents(1200)))
                .unwrap();
        };
        let (outcome, _) = tokio::join!(send(&app), add_flan);
        outcome.unwrap();

        let left = app.state.draft.snapshot();
        assert_eq!(left.item_count(), 1);
        assert_eq!(left.items()[0].name, "Flan");
        assert_eq!(left.table_id.as_deref(), Some("t-1"));
        assert_eq!(backend.orders()[0].items.len(), 2);
    }
}
