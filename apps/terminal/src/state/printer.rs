//! # Printer State
//!
//! The printer handle plus the address remembered on this machine.
//!
//! ## Address Resolution
//! ```text
//! remembered (secure storage, comanda.printer)
//!      │ none
//!      ▼
//! store config printer_address (backend)
//!      │ none
//!      ▼
//! [printer].address (pos.toml / COMANDA_PRINTER_ADDRESS)
//!      │ none
//!      ▼
//! ValidationError: printer address is required
//! ```
//!
//! A failed print forgets the remembered address so the next attempt falls
//! back to the store's printer. The store config itself is left alone.

use std::sync::Arc;
use tracing::{info, warn};

use comanda_client::{SecureStore, PRINTER_KEY};
use comanda_core::PrintOrder;
use comanda_print::{PrintOutcome, PrinterHandle};

use crate::error::AppResult;

pub struct PrinterState {
    handle: Arc<PrinterHandle>,
    secure: Arc<dyn SecureStore>,
}

impl PrinterState {
    pub fn new(handle: PrinterHandle, secure: Arc<dyn SecureStore>) -> Self {
        PrinterState {
            handle: Arc::new(handle),
            secure,
        }
    }

    pub fn handle(&self) -> &Arc<PrinterHandle> {
        &self.handle
    }

    /// Address chosen on this machine. Storage errors read as "none".
    pub fn remembered_address(&self) -> Option<String> {
        match self.secure.get(PRINTER_KEY) {
            Ok(address) => address.filter(|a| !a.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read remembered printer");
                None
            }
        }
    }

    pub fn remember(&self, address: &str) -> AppResult<()> {
        self.secure.set(PRINTER_KEY, address.trim())?;
        Ok(())
    }

    pub fn forget(&self) {
        if let Err(e) = self.secure.delete(PRINTER_KEY) {
            warn!(error = %e, "Could not forget remembered printer");
        }
    }

    /// Prints through the handle. Never fails; the outcome carries the error.
    pub async fn print(&self, order: &PrintOrder, address: &str) -> PrintOutcome {
        let outcome = self.handle.print(order, address).await;
        match &outcome.error {
            None => {
                info!(order_number = %order.order_number(), address = %address, "Ticket printed");
            }
            Some(error) => {
                warn!(
                    order_number = %order.order_number(),
                    address = %address,
                    error = %error,
                    "Ticket not printed, forgetting remembered printer"
                );
                self.forget();
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_client::MemoryStore;
    use comanda_core::{Money, OrderType, PrintItem};
    use comanda_print::{AllowAll, RecordingTransport, TicketLayout};

    fn order() -> PrintOrder {
        PrintOrder::new(
            "12",
            OrderType::DineIn,
            None,
            Some("Mesa 4".into()),
            vec![PrintItem::new("Taco", 2, Money::from_cents(2500), None).unwrap()],
        )
        .unwrap()
    }

    fn state(transport: RecordingTransport) -> PrinterState {
        let handle = PrinterHandle::new(Box::new(transport), Arc::new(AllowAll), TicketLayout::default());
        PrinterState::new(handle, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_failed_print_forgets_address() {
        let mut transport = RecordingTransport::new();
        transport.fail_on_op(1);
        let printer = state(transport);
        printer.remember("/dev/rfcomm0").unwrap();

        let outcome = printer.print(&order(), "/dev/rfcomm0").await;

        assert!(!outcome.success);
        assert!(printer.remembered_address().is_none());
    }

    #[tokio::test]
    async fn test_successful_print_keeps_address() {
        let printer = state(RecordingTransport::new());
        printer.remember(" COM5 ").unwrap();

        assert!(printer.print(&order(), "COM5").await.success);
        assert_eq!(printer.remembered_address().as_deref(), Some("COM5"));
    }
}
