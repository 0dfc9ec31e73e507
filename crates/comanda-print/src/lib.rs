//! # comanda-print: Kitchen Tickets for Comanda POS
//!
//! Composes kitchen tickets from confirmed orders and drives Bluetooth
//! thermal printers.
//!
//! ## Print Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Print Pipeline                                   │
//! │                                                                         │
//! │  PrintOrder ──► compose() ──► Vec<PrintCommand> ──► print_ticket()      │
//! │  (immutable)    (pure)        Image, Align, Text,    connect            │
//! │                               Columns, Feed, Cut     replay each        │
//! │                                                      disconnect         │
//! │                                                          │              │
//! │                                           ┌──────────────▼──────────┐   │
//! │                                           │ dyn PrinterTransport    │   │
//! │                                           │  ├─ SerialTransport     │   │
//! │                                           │  │   (ESC/POS over SPP) │   │
//! │                                           │  └─ RecordingTransport  │   │
//! │                                           └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`composer`] - Ticket layout and the print sequence
//! - [`command`] - Printer command model
//! - [`transport`] - Transport and permission traits
//! - [`escpos`] - ESC/POS byte encoding
//! - [`serial`] - Bluetooth SPP over serial ports
//! - [`recording`] - In-memory transport for dry runs and tests
//! - [`handle`] - Exclusive, queued access to one printer
//! - [`logo`] - Logo rasterization

pub mod command;
pub mod composer;
pub mod error;
pub mod escpos;
pub mod handle;
pub mod logo;
pub mod recording;
pub mod serial;
pub mod transport;

pub use command::{Align, Column, PrintCommand};
pub use composer::{compose, print_ticket, render_plain, PrintOutcome, TicketLayout};
pub use error::{PrintError, PrintResult};
pub use handle::PrinterHandle;
pub use logo::{Logo, MAX_LOGO_WIDTH_DOTS};
pub use recording::{Op, OpLog, RecordingTransport};
pub use serial::{SerialConfig, SerialTransport};
pub use transport::{
    AllowAll, ConnectionState, DevicePermissionGate, PairedDevice, PermissionGate,
    PrinterTransport,
};
