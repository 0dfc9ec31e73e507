//! # Configuration State
//!
//! Terminal configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`COMANDA_*`)
//! 2. Config file (`pos.toml`)
//! 3. Defaults
//!
//! Read-only after initialization, so no lock.

use std::path::PathBuf;

use comanda_client::PosConfig;
use comanda_print::{Logo, TicketLayout, MAX_LOGO_WIDTH_DOTS};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    pub config: PosConfig,
    /// Where the config was read from, if anywhere.
    pub path: Option<PathBuf>,
}

impl ConfigState {
    pub fn new(config: PosConfig, path: Option<PathBuf>) -> Self {
        ConfigState { config, path }
    }

    /// Pinned store id, if the config sets one.
    pub fn store_override(&self) -> Option<&str> {
        self.config
            .store
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Ticket layout from the printer section. A logo that cannot be read is
    /// logged and left out; tickets still print.
    pub fn ticket_layout(&self) -> TicketLayout {
        let printer = &self.config.printer;
        let mut layout = TicketLayout::new(printer.line_width);
        layout.feed_lines = printer.feed_lines;

        if let Some(path) = &printer.logo_path {
            match Logo::from_path(path, MAX_LOGO_WIDTH_DOTS) {
                Ok(logo) => layout = layout.with_logo(logo),
                Err(e) => warn!(?path, error = %e, "Logo unavailable, printing without it"),
            }
        }
        layout
    }
}
