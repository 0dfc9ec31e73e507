//! # Printer Transport
//!
//! The seam between the composer and a physical printer.
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Transport Lifecycle                                 │
//! │                                                                         │
//! │   ┌──────────────┐  connect(addr)  ┌──────────────┐                    │
//! │   │ Disconnected │ ──────────────► │  Connected   │ ◄──┐               │
//! │   └──────────────┘                 └──────┬───────┘    │ print_text    │
//! │          ▲                                │            │ print_columns │
//! │          │          disconnect()          │            │ print_image   │
//! │          └────────────────────────────────┘            │ set_align     │
//! │                                                        │ feed / cut    │
//! │   Any primitive while Disconnected ──► NotConnected ───┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transport holds at most one connection. Callers that share a transport
//! go through [`crate::PrinterHandle`], which serializes whole tickets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::command::{Align, Column};
use crate::error::{PrintError, PrintResult};
use crate::logo::Logo;

// =============================================================================
// Paired Device
// =============================================================================

/// A printer the OS already knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedDevice {
    pub name: String,
    /// What `connect` takes. For serial transports this is the port name.
    pub address: String,
}

// =============================================================================
// Connection State
// =============================================================================

/// Connection state, for logs and status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected { address: String },
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connected { address } => write!(f, "Connected to {}", address),
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// A printer connection.
#[async_trait]
pub trait PrinterTransport: Send {
    /// Lists printers already paired with this machine.
    async fn scan_paired(&mut self) -> PrintResult<Vec<PairedDevice>>;

    /// Opens a connection. Must succeed before any primitive.
    async fn connect(&mut self, address: &str) -> PrintResult<()>;

    async fn set_align(&mut self, align: Align) -> PrintResult<()>;

    async fn print_text(&mut self, text: &str) -> PrintResult<()>;

    async fn print_columns(&mut self, columns: &[Column]) -> PrintResult<()>;

    async fn print_image(&mut self, logo: &Logo) -> PrintResult<()>;

    async fn feed(&mut self, lines: u8) -> PrintResult<()>;

    async fn cut(&mut self) -> PrintResult<()>;

    /// Closes the connection. Closing an idle transport is not an error.
    async fn disconnect(&mut self) -> PrintResult<()>;

    fn state(&self) -> ConnectionState;
}

// =============================================================================
// Permission Gate
// =============================================================================

/// Checked before a scan and before every connect.
///
/// A denial is returned as [`PrintError::PermissionDenied`] and the printer is
/// never touched.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn check_scan(&self) -> PrintResult<()> {
        Ok(())
    }

    async fn check_connect(&self, address: &str) -> PrintResult<()>;
}

/// For platforms without a Bluetooth permission model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionGate for AllowAll {
    async fn check_connect(&self, _address: &str) -> PrintResult<()> {
        Ok(())
    }
}

/// Pre-flight check of the device node behind an address.
///
/// Catches a missing node and a node whose mode bits make it read-only. It
/// does not check group membership: a `0660 root:dialout` node passes for a
/// user outside `dialout`, and the denial then surfaces from
/// [`crate::serial::SerialTransport`]'s open as
/// [`PrintError::PermissionDenied`].
///
/// Addresses that are not paths (Windows `COM3`) pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevicePermissionGate;

#[async_trait]
impl PermissionGate for DevicePermissionGate {
    async fn check_connect(&self, address: &str) -> PrintResult<()> {
        if !Path::new(address).is_absolute() {
            return Ok(());
        }

        match tokio::fs::metadata(address).await {
            Ok(meta) if meta.permissions().readonly() => Err(PrintError::PermissionDenied(
                format!("{} is read-only", address),
            )),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(PrintError::PermissionDenied(format!("{}: {}", address, e)))
            }
            Err(e) => Err(PrintError::ConnectFailed {
                address: address.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
