//! # State Module
//!
//! Focused state types, each command takes only the ones it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────────┐ │
//! │  │ DraftState │ │ SessionState │ │ PrinterState │ │ ConfigState      │ │
//! │  │            │ │              │ │              │ │                  │ │
//! │  │ OrderDraft │ │ session mgr  │ │ handle       │ │ PosConfig        │ │
//! │  │ (Mutex)    │ │ repositories │ │ remembered   │ │ (read-only)      │ │
//! │  │            │ │ store        │ │ address      │ │                  │ │
//! │  └────────────┘ └──────────────┘ └──────────────┘ └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod draft;
pub mod printer;
pub mod session;

pub use config::ConfigState;
pub use draft::{DraftState, SubmissionGuard};
pub use printer::PrinterState;
pub use session::SessionState;

use std::sync::Arc;

use comanda_client::{AuthBackend, SecureStore};
use comanda_print::{PermissionGate, PrinterHandle, PrinterTransport};

use crate::error::AppResult;

/// Every state object, built once at startup.
pub struct AppState {
    pub config: ConfigState,
    pub draft: DraftState,
    pub session: SessionState,
    pub printer: PrinterState,
}

impl AppState {
    pub fn new(
        config: ConfigState,
        auth: Arc<dyn AuthBackend>,
        secure: Arc<dyn SecureStore>,
        transport: Box<dyn PrinterTransport>,
        gate: Arc<dyn PermissionGate>,
    ) -> AppResult<Self> {
        let session = SessionState::build(&config.config, auth, secure.clone())?;
        let handle = PrinterHandle::new(transport, gate, config.ticket_layout());

        Ok(AppState {
            draft: DraftState::new(),
            session,
            printer: PrinterState::new(handle, secure),
            config,
        })
    }
}
