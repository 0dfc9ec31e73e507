//! # Ticket Composer
//!
//! Turns a [`PrintOrder`] into printer commands and replays them on a
//! transport.
//!
//! ## Ticket Layout (48 columns, 80 mm)
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │               [ logo, if any ]                 │
//! │Comanda: 17                                     │
//! │Mesa: Terraza 2          (or Nombre: Ana)       │
//! │Tipo: Para aqui                                 │
//! │                                                │
//! │Producto                          Cant    Precio│
//! │------------------------------------------------│
//! │Taco                                 2     50.00│
//! │Agua                                 1     15.00│
//! │  - sin hielo                                   │
//! │------------------------------------------------│
//! │TOTAL                                      65.00│
//! │                                                │
//! └──────────────────── cut ───────────────────────┘
//! ```
//!
//! ## Failure Handling
//! ```text
//! connect ──► cmd 1 ──► cmd 2 ──► ... ──► cmd n ──► disconnect
//!                          │                             ▲
//!                          └── error: stop, keep msg ────┘
//! ```
//! No retry and no compensating cut. Whatever reached the paper stays
//! there, and the outcome carries the error.

use comanda_core::{normalize_for_printer, OrderType, PrintOrder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::command::{Align, Column, PrintCommand};
use crate::error::{PrintError, PrintResult};
use crate::logo::Logo;
use crate::transport::PrinterTransport;

/// Characters per line on 80 mm paper.
pub const DEFAULT_LINE_WIDTH: usize = 48;

/// Width of the quantity column.
pub const QTY_WIDTH: usize = 6;

/// Width of the price column. Wider amounts widen it for their row.
pub const PRICE_WIDTH: usize = 10;

/// Blank lines fed before the cut.
pub const DEFAULT_FEED_LINES: u8 = 3;

// =============================================================================
// Layout
// =============================================================================

/// Physical layout of a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLayout {
    pub line_width: usize,
    pub feed_lines: u8,
    pub logo: Option<Logo>,
}

impl TicketLayout {
    pub fn new(line_width: usize) -> Self {
        TicketLayout {
            line_width,
            ..Self::default()
        }
    }

    pub fn with_logo(mut self, logo: Logo) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Product column takes what quantity and price leave.
    pub fn name_width(&self) -> usize {
        self.line_width.saturating_sub(QTY_WIDTH + PRICE_WIDTH).max(1)
    }

    fn separator(&self) -> PrintCommand {
        PrintCommand::Text("-".repeat(self.line_width))
    }

    /// Amounts are never truncated: a price longer than the column takes
    /// the extra room from the name.
    fn row(&self, name: &str, qty: &str, price: &str) -> PrintCommand {
        let price_width = PRICE_WIDTH.max(price.len());
        let name_width = self
            .line_width
            .saturating_sub(QTY_WIDTH + price_width)
            .max(1);
        PrintCommand::Columns(vec![
            Column::left(name, name_width),
            Column::right(qty, QTY_WIDTH),
            Column::right(price, price_width),
        ])
    }
}

impl Default for TicketLayout {
    fn default() -> Self {
        TicketLayout {
            line_width: DEFAULT_LINE_WIDTH,
            feed_lines: DEFAULT_FEED_LINES,
            logo: None,
        }
    }
}

// =============================================================================
// Composition
// =============================================================================

/// Builds the command sequence for a ticket. Deterministic.
pub fn compose(order: &PrintOrder, layout: &TicketLayout) -> Vec<PrintCommand> {
    let mut commands = Vec::with_capacity(order.items().len() * 2 + 16);

    if let Some(logo) = &layout.logo {
        commands.push(PrintCommand::Image(logo.clone()));
    }

    // Header
    commands.push(PrintCommand::Align(Align::Left));
    commands.push(PrintCommand::Text(format!(
        "Comanda: {}",
        normalize_for_printer(order.order_number())
    )));
    match order.order_type() {
        OrderType::DineIn => commands.push(PrintCommand::Text(format!(
            "Mesa: {}",
            normalize_for_printer(order.table_name().unwrap_or_default())
        ))),
        OrderType::Takeaway => commands.push(PrintCommand::Text(format!(
            "Nombre: {}",
            normalize_for_printer(order.customer_name().unwrap_or_default())
        ))),
    }
    commands.push(PrintCommand::Text(format!(
        "Tipo: {}",
        order.order_type().ticket_label()
    )));
    commands.push(PrintCommand::Text(String::new()));

    // Items
    commands.push(layout.row("Producto", "Cant", "Precio"));
    commands.push(layout.separator());
    for item in order.items() {
        commands.push(layout.row(
            normalize_for_printer(item.name()).trim(),
            &item.quantity().to_string(),
            &item.line_total().to_decimal_string(),
        ));
        if let Some(notes) = item.notes() {
            let notes = normalize_for_printer(notes.trim());
            if !notes.is_empty() {
                commands.push(PrintCommand::Text(format!("  - {}", notes)));
            }
        }
    }

    // Total
    commands.push(layout.separator());
    commands.push(layout.row("TOTAL", "", &order.total().to_decimal_string()));

    commands.push(PrintCommand::Feed(layout.feed_lines));
    commands.push(PrintCommand::Cut);
    commands
}

/// Renders commands as plain text, one line per printed line. Used for
/// previews and logs.
pub fn render_plain(commands: &[PrintCommand]) -> String {
    let mut out = String::new();
    for command in commands {
        match command {
            PrintCommand::Image(logo) => {
                out.push_str(&format!("[logo {}x{}]\n", logo.width_dots(), logo.height_dots()))
            }
            PrintCommand::Text(text) => {
                out.push_str(text);
                out.push('\n');
            }
            PrintCommand::Columns(columns) => {
                out.push_str(&crate::command::render_row(columns));
                out.push('\n');
            }
            PrintCommand::Feed(lines) => {
                out.push_str(&"\n".repeat(*lines as usize));
            }
            PrintCommand::Cut => out.push_str("[cut]\n"),
            PrintCommand::Align(_) => {}
        }
    }
    out
}

// =============================================================================
// Printing
// =============================================================================

/// Result of a print attempt, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl PrintOutcome {
    pub fn ok() -> Self {
        PrintOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: &PrintError) -> Self {
        PrintOutcome {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Sends one command to a transport.
pub async fn replay(transport: &mut dyn PrinterTransport, command: &PrintCommand) -> PrintResult<()> {
    match command {
        PrintCommand::Image(logo) => transport.print_image(logo).await,
        PrintCommand::Align(align) => transport.set_align(*align).await,
        PrintCommand::Text(text) => transport.print_text(text).await,
        PrintCommand::Columns(columns) => transport.print_columns(columns).await,
        PrintCommand::Feed(lines) => transport.feed(*lines).await,
        PrintCommand::Cut => transport.cut().await,
    }
}

/// Prints a ticket: connect, replay every command, disconnect.
///
/// Never fails: every error ends up in the returned [`PrintOutcome`]. The
/// transport is disconnected whether or not the ticket made it.
pub async fn print_ticket(
    transport: &mut dyn PrinterTransport,
    order: &PrintOrder,
    layout: &TicketLayout,
    address: &str,
) -> PrintOutcome {
    let address = address.trim();
    if address.is_empty() {
        return PrintOutcome::failed(&PrintError::MissingAddress);
    }

    let commands = compose(order, layout);
    let result = send(transport, &commands, address).await;

    if let Err(e) = transport.disconnect().await {
        warn!(address = %address, error = %e, "Printer disconnect failed");
    }

    match result {
        Ok(()) => {
            info!(
                order_number = %order.order_number(),
                address = %address,
                "Ticket printed"
            );
            PrintOutcome::ok()
        }
        Err(e) => {
            warn!(
                order_number = %order.order_number(),
                address = %address,
                error = %e,
                "Ticket print failed"
            );
            PrintOutcome::failed(&e)
        }
    }
}

async fn send(
    transport: &mut dyn PrinterTransport,
    commands: &[PrintCommand],
    address: &str,
) -> PrintResult<()> {
    transport.connect(address).await?;
    for (index, command) in commands.iter().enumerate() {
        if let Err(e) = replay(transport, command).await {
            debug!(index, total = commands.len(), "Stopping ticket after failed command");
            return Err(e);
        }
    }
    Ok(())
}
