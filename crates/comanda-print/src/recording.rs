//! A transport that records what it was asked to print.
//!
//! Backs the terminal's `--dry-run` mode and the tests. Failures can be
//! injected at a given operation to exercise abort paths.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::command::{render_row, Align, Column};
use crate::error::{PrintError, PrintResult};
use crate::logo::Logo;
use crate::transport::{ConnectionState, PairedDevice, PrinterTransport};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Connect(String),
    Align(Align),
    Text(String),
    /// The row as it would print.
    Columns(String),
    Image { width_dots: u32, height_dots: u32 },
    Feed(u8),
    Cut,
    Disconnect,
}

/// Shared view of the recorded operations.
#[derive(Debug, Clone, Default)]
pub struct OpLog(Arc<Mutex<Vec<Op>>>);

impl OpLog {
    pub fn ops(&self) -> Vec<Op> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Printed lines (text and column rows), in order.
    pub fn printed_lines(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Text(text) | Op::Columns(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, op: Op) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }
}

/// In-memory [`PrinterTransport`].
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: OpLog,
    paired: Vec<PairedDevice>,
    connected: Option<String>,
    fail_on: Option<usize>,
    attempts: usize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices returned by `scan_paired`.
    pub fn with_paired(mut self, paired: Vec<PairedDevice>) -> Self {
        self.paired = paired;
        self
    }

    /// Makes the `index`-th operation (0 = first connect) fail with a
    /// write error. Disconnects are not counted and never fail.
    pub fn fail_on_op(&mut self, index: usize) {
        self.fail_on = Some(index);
    }

    pub fn log(&self) -> OpLog {
        self.log.clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.log.ops()
    }

    fn attempt(&mut self, op: Op) -> PrintResult<()> {
        if !matches!(op, Op::Connect(_)) && self.connected.is_none() {
            return Err(PrintError::NotConnected);
        }

        let index = self.attempts;
        self.attempts += 1;
        if self.fail_on == Some(index) {
            return Err(PrintError::WriteFailed(format!("injected failure at op {}", index)));
        }

        if let Op::Connect(address) = &op {
            self.connected = Some(address.clone());
        }
        self.log.push(op);
        Ok(())
    }
}

#[async_trait]
impl PrinterTransport for RecordingTransport {
    async fn scan_paired(&mut self) -> PrintResult<Vec<PairedDevice>> {
        Ok(self.paired.clone())
    }

    async fn connect(&mut self, address: &str) -> PrintResult<()> {
        self.attempt(Op::Connect(address.to_string()))
    }

    async fn set_align(&mut self, align: Align) -> PrintResult<()> {
        self.attempt(Op::Align(align))
    }

    async fn print_text(&mut self, text: &str) -> PrintResult<()> {
        self.attempt(Op::Text(text.to_string()))
    }

    async fn print_columns(&mut self, columns: &[Column]) -> PrintResult<()> {
        self.attempt(Op::Columns(render_row(columns)))
    }

    async fn print_image(&mut self, logo: &Logo) -> PrintResult<()> {
        self.attempt(Op::Image {
            width_dots: logo.width_dots(),
            height_dots: logo.height_dots(),
        })
    }

    async fn feed(&mut self, lines: u8) -> PrintResult<()> {
        self.attempt(Op::Feed(lines))
    }

    async fn cut(&mut self) -> PrintResult<()> {
        self.attempt(Op::Cut)
    }

    async fn disconnect(&mut self) -> PrintResult<()> {
        self.connected = None;
        self.log.push(Op::Disconnect);
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        match &self.connected {
            Some(address) => ConnectionState::Connected {
                address: address.clone(),
            },
            None => ConnectionState::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_connected() {
        let mut transport = RecordingTransport::new();
        assert!(matches!(
            transport.print_text("x").await,
            Err(PrintError::NotConnected)
        ));
        assert!(transport.ops().is_empty());
    }

    #[tokio::test]
    async fn test_log_is_shared() {
        let mut transport = RecordingTransport::new();
        let log = transport.log();

        transport.connect("COM5").await.unwrap();
        transport.print_text("hola").await.unwrap();

        assert_eq!(log.printed_lines(), vec!["hola".to_string()]);
        assert_eq!(
            transport.state(),
            ConnectionState::Connected {
                address: "COM5".into()
            }
        );
    }
}
