//! Bluetooth SPP printers over serial ports.
//!
//! Paired SPP printers surface as serial ports on every desktop OS:
//!
//! | OS      | Address                 |
//! |---------|-------------------------|
//! | Linux   | `/dev/rfcomm0`          |
//! | macOS   | `/dev/cu.Printer-SPP`   |
//! | Windows | `COM5` (outgoing port)  |
//!
//! `serialport` is blocking, so every open and write runs on tokio's
//! blocking pool.

use async_trait::async_trait;
use serialport::{SerialPort, SerialPortType};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::command::{Align, Column};
use crate::error::{PrintError, PrintResult};
use crate::escpos::EscPosEncoder;
use crate::logo::Logo;
use crate::transport::{ConnectionState, PairedDevice, PrinterTransport};

/// Serial link settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Ignored by RFCOMM but required by the API.
    pub baud_rate: u32,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baud_rate: 9600,
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Printer transport over a serial port.
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
    address: Option<String>,
    encoder: EscPosEncoder,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        SerialTransport {
            config,
            port: None,
            address: None,
            encoder: EscPosEncoder::new(),
        }
    }

    /// Sends whatever the encoder holds.
    async fn flush_encoder(&mut self) -> PrintResult<()> {
        let bytes = self.encoder.take();
        let mut port = self.port.take().ok_or(PrintError::NotConnected)?;

        let joined = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&bytes).and_then(|_| port.flush());
            (port, result)
        })
        .await;

        match joined {
            Ok((port, Ok(()))) => {
                self.port = Some(port);
                Ok(())
            }
            Ok((port, Err(e))) => {
                self.port = Some(port);
                Err(PrintError::WriteFailed(e.to_string()))
            }
            Err(e) => {
                // the port went down with the blocking task
                self.address = None;
                Err(PrintError::WriteFailed(e.to_string()))
            }
        }
    }

    fn require_connected(&self) -> PrintResult<()> {
        if self.port.is_some() {
            Ok(())
        } else {
            Err(PrintError::NotConnected)
        }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new(SerialConfig::default())
    }
}

fn is_bluetooth(port: &serialport::SerialPortInfo) -> bool {
    match port.port_type {
        SerialPortType::BluetoothPort => true,
        // RFCOMM bindings are reported as Unknown on Linux
        SerialPortType::Unknown => port.port_name.contains("rfcomm"),
        _ => false,
    }
}

/// Maps an open failure, keeping a permission denial distinct so the
/// caller can tell the operator about device access.
fn open_error(address: &str, e: serialport::Error) -> PrintError {
    if let serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) = e.kind {
        return PrintError::PermissionDenied(format!("{}: {}", address, e));
    }
    PrintError::ConnectFailed {
        address: address.to_string(),
        reason: e.to_string(),
    }
}

fn display_name(port_name: &str) -> String {
    let base = port_name.rsplit('/').next().unwrap_or(port_name);
    base.strip_prefix("cu.").unwrap_or(base).to_string()
}

#[async_trait]
impl PrinterTransport for SerialTransport {
    async fn scan_paired(&mut self) -> PrintResult<Vec<PairedDevice>> {
        let ports = tokio::task::spawn_blocking(serialport::available_ports)
            .await
            .map_err(|e| PrintError::ScanFailed(e.to_string()))?
            .map_err(|e| PrintError::ScanFailed(e.to_string()))?;

        let devices: Vec<PairedDevice> = ports
            .iter()
            .filter(|p| is_bluetooth(p))
            .map(|p| PairedDevice {
                name: display_name(&p.port_name),
                address: p.port_name.clone(),
            })
            .collect();

        debug!(count = devices.len(), "Paired printers listed");
        Ok(devices)
    }

    async fn connect(&mut self, address: &str) -> PrintResult<()> {
        if self.address.as_deref() == Some(address) && self.port.is_some() {
            return Ok(());
        }
        if self.port.is_some() {
            self.disconnect().await?;
        }

        let builder = serialport::new(address, self.config.baud_rate)
            .timeout(self.config.write_timeout);
        let open = tokio::task::spawn_blocking(move || builder.open());

        let timeout = self.config.connect_timeout;
        let port = match tokio::time::timeout(timeout, open).await {
            Err(_) => return Err(PrintError::Timeout(timeout.as_secs())),
            Ok(Err(join)) => {
                return Err(PrintError::ConnectFailed {
                    address: address.to_string(),
                    reason: join.to_string(),
                })
            }
            Ok(Ok(Err(e))) => return Err(open_error(address, e)),
            Ok(Ok(Ok(port))) => port,
        };

        self.port = Some(port);
        self.address = Some(address.to_string());
        info!(address = %address, "Printer connected");

        self.encoder.init();
        self.flush_encoder().await
    }

    async fn set_align(&mut self, align: Align) -> PrintResult<()> {
        self.require_connected()?;
        self.encoder.align(align);
        self.flush_encoder().await
    }

    async fn print_text(&mut self, text: &str) -> PrintResult<()> {
        self.require_connected()?;
        self.encoder.line(text);
        self.flush_encoder().await
    }

    async fn print_columns(&mut self, columns: &[Column]) -> PrintResult<()> {
        self.require_connected()?;
        self.encoder.columns(columns);
        self.flush_encoder().await
    }

    async fn print_image(&mut self, logo: &Logo) -> PrintResult<()> {
        self.require_connected()?;
        self.encoder.raster(logo);
        self.flush_encoder().await
    }

    async fn feed(&mut self, lines: u8) -> PrintResult<()> {
        self.require_connected()?;
        self.encoder.feed(lines);
        self.flush_encoder().await
    }

    async fn cut(&mut self) -> PrintResult<()> {
        self.require_connected()?;
        self.encoder.cut();
        self.flush_encoder().await
    }

    async fn disconnect(&mut self) -> PrintResult<()> {
        self.encoder.take();
        let address = self.address.take();
        if let Some(port) = self.port.take() {
            // dropping the port closes it; do it off the runtime
            if let Err(e) = tokio::task::spawn_blocking(move || drop(port)).await {
                warn!(error = %e, "Printer port close panicked");
            }
            info!(address = ?address, "Printer disconnected");
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        match (&self.port, &self.address) {
            (Some(_), Some(address)) => ConnectionState::Connected {
                address: address.clone(),
            },
            _ => ConnectionState::Disconnected,
        }
    }
}
