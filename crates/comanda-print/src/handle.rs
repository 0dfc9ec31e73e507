//! # Printer Handle
//!
//! One printer, one ticket at a time.
//!
//! ```text
//! send_to_kitchen ──┐
//! reprint_order ────┼──► PrinterHandle::print ──► gate ──► lock ──► print_ticket
//! append_items ─────┘                                       │
//!                                            (others wait here, in order)
//! ```
//!
//! Bluetooth printers accept a single connection. The mutex makes sure two
//! tickets never interleave on the same link.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use comanda_core::PrintOrder;

use crate::composer::{print_ticket, PrintOutcome, TicketLayout};
use crate::error::{PrintError, PrintResult};
use crate::transport::{ConnectionState, PairedDevice, PermissionGate, PrinterTransport};

/// Exclusive owner of a printer transport.
pub struct PrinterHandle {
    transport: Mutex<Box<dyn PrinterTransport>>,
    gate: Arc<dyn PermissionGate>,
    layout: TicketLayout,
}

impl PrinterHandle {
    pub fn new(
        transport: Box<dyn PrinterTransport>,
        gate: Arc<dyn PermissionGate>,
        layout: TicketLayout,
    ) -> Self {
        PrinterHandle {
            transport: Mutex::new(transport),
            gate,
            layout,
        }
    }

    pub fn layout(&self) -> &TicketLayout {
        &self.layout
    }

    /// Lists paired printers.
    pub async fn scan(&self) -> PrintResult<Vec<PairedDevice>> {
        self.gate.check_scan().await?;
        let mut transport = self.transport.lock().await;
        transport.scan_paired().await
    }

    /// Prints a ticket. Waits for any ticket already printing.
    pub async fn print(&self, order: &PrintOrder, address: &str) -> PrintOutcome {
        if address.trim().is_empty() {
            return PrintOutcome::failed(&PrintError::MissingAddress);
        }

        if let Err(e) = self.gate.check_connect(address).await {
            warn!(address = %address, error = %e, "Printer permission check failed");
            return PrintOutcome::failed(&e);
        }

        let mut transport = self.transport.lock().await;
        print_ticket(&mut **transport, order, &self.layout, address).await
    }

    pub async fn state(&self) -> ConnectionState {
        self.transport.lock().await.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Op, RecordingTransport};
    use crate::transport::AllowAll;
    use async_trait::async_trait;
    use comanda_core::{Money, OrderType, PrintItem};

    struct DenyAll;

    #[async_trait]
    impl PermissionGate for DenyAll {
        async fn check_scan(&self) -> PrintResult<()> {
            Err(PrintError::PermissionDenied("bluetooth scan".into()))
        }

        async fn check_connect(&self, _address: &str) -> PrintResult<()> {
            Err(PrintError::PermissionDenied("bluetooth connect".into()))
        }
    }

    fn order(number: &str) -> PrintOrder {
        PrintOrder::new(
            number,
            OrderType::Takeaway,
            Some("Ana".into()),
            None,
            vec![PrintItem::new("Taco", 1, Money::from_cents(2500), None).unwrap()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_permission_denied_never_touches_printer() {
        let transport = RecordingTransport::new();
        let log = transport.log();
        let handle = PrinterHandle::new(
            Box::new(transport),
            Arc::new(DenyAll),
            TicketLayout::default(),
        );

        let outcome = handle.print(&order("1"), "/dev/rfcomm0").await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("permission denied"));
        assert!(log.ops().is_empty());
        assert!(matches!(
            handle.scan().await,
            Err(PrintError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_prints_do_not_interleave() {
        let transport = RecordingTransport::new();
        let log = transport.log();
        let handle = Arc::new(PrinterHandle::new(
            Box::new(transport),
            Arc::new(AllowAll),
            TicketLayout::default(),
        ));

        let a = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.print(&order("1"), "COM5").await })
        };
        let b = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.print(&order("2"), "COM5").await })
        };
        assert!(a.await.unwrap().success);
        assert!(b.await.unwrap().success);

        // each connect is followed by its own disconnect before the next connect
        let ops = log.ops();
        let boundaries: Vec<&Op> = ops
            .iter()
            .filter(|op| matches!(op, Op::Connect(_) | Op::Disconnect))
            .collect();
        assert_eq!(boundaries.len(), 4);
        assert!(matches!(boundaries[0], Op::Connect(_)));
        assert_eq!(boundaries[1], &Op::Disconnect);
        assert!(matches!(boundaries[2], Op::Connect(_)));
        assert_eq!(boundaries[3], &Op::Disconnect);
    }

    #[tokio::test]
    async fn test_scan_lists_paired() {
        let transport = RecordingTransport::new().with_paired(vec![PairedDevice {
            name: "Printer-SPP".into(),
            address: "/dev/cu.Printer-SPP".into(),
        }]);
        let handle = PrinterHandle::new(
            Box::new(transport),
            Arc::new(AllowAll),
            TicketLayout::default(),
        );

        let devices = handle.scan().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(handle.state().await, ConnectionState::Disconnected);
    }
}
