//! # Printer Commands
//!
//! Finding, selecting and checking the kitchen printer.
//!
//! ```text
//! scan_printers() ──► paired serial/Bluetooth ports
//!        │
//!        ▼ operator picks one
//! select_printer(name, address)
//!        ├──► store.printer_name / printer_address  (backend, all terminals)
//!        └──► comanda.printer                        (this machine)
//! ```

use serde::Serialize;
use tracing::{debug, info};

use comanda_core::{StoreConfig, ValidationError};
use comanda_print::PairedDevice;

use crate::commands::order::printer_address;
use crate::error::AppResult;
use crate::state::{ConfigState, PrinterState, SessionState};

/// Printer as the terminal sees it right now.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatus {
    pub connection: String,
    pub address: Option<String>,
    pub line_width: usize,
}

pub async fn scan_printers(printer: &PrinterState) -> AppResult<Vec<PairedDevice>> {
    debug!("scan_printers command");
    Ok(printer.handle().scan().await?)
}

/// Makes `address` the store's printer and remembers it on this machine.
pub async fn select_printer(
    session: &SessionState,
    printer: &PrinterState,
    name: Option<&str>,
    address: &str,
) -> AppResult<StoreConfig> {
    debug!(address, "select_printer command");

    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::required("printer address").into());
    }
    let store_id = session.store_id()?;

    let config = session
        .repos()
        .store()
        .update_printer(&store_id, name, Some(address))
        .await?;
    printer.remember(address)?;

    info!(store_id = %store_id, address, "Printer selected");
    Ok(config)
}

/// Forgets the printer on this machine and, with `store_wide`, for the store.
pub async fn clear_printer(
    session: &SessionState,
    printer: &PrinterState,
    store_wide: bool,
) -> AppResult<()> {
    printer.forget();
    if store_wide {
        let store_id = session.store_id()?;
        session
            .repos()
            .store()
            .update_printer(&store_id, None, None)
            .await?;
    }
    Ok(())
}

pub async fn printer_status(
    session: &SessionState,
    printer: &PrinterState,
    config: &ConfigState,
) -> AppResult<PrinterStatus> {
    let address = match session.store_id() {
        Ok(store_id) => printer_address(session, printer, config, &store_id).await.ok(),
        Err(_) => printer.remembered_address(),
    };

    Ok(PrinterStatus {
        connection: printer.handle().state().await.to_string(),
        address,
        line_width: printer.handle().layout().line_width,
    })
}
