//! # Comanda Terminal Library
//!
//! Orchestration layer of Comanda POS: application state plus the commands a
//! front end (here, the `comanda` CLI) drives.
//!
//! ## Module Organization
//! ```text
//! comanda_terminal/
//! ├── lib.rs          ◄─── You are here (startup wiring)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── draft.rs    ◄─── Order draft (Arc<Mutex>)
//! │   ├── session.rs  ◄─── Session manager, repositories, current store
//! │   ├── printer.rs  ◄─── Printer handle, remembered address
//! │   └── config.rs   ◄─── PosConfig
//! ├── commands/       ◄─── One module per screen
//! └── error.rs        ◄─── AppError { code, message }
//! ```

pub mod commands;
pub mod error;
pub mod state;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use comanda_client::{GoTrueAuth, KeyringStore, PosConfig};
use comanda_print::{
    AllowAll, DevicePermissionGate, OpLog, PermissionGate, RecordingTransport, SerialConfig,
    SerialTransport,
};

use crate::error::AppResult;
use crate::state::{AppState, ConfigState};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=comanda_client=trace` - Trace for one crate only
/// - Default: INFO level
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the application state.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Load config ──► pos.toml, COMANDA_* overrides, validation           │
/// │  2. Secure storage ──► OS keyring                                       │
/// │  3. Auth + REST clients ──► backend url + anon key                      │
/// │  4. Printer ──► serial transport (or recording transport for dry runs)  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// With `dry_run`, tickets go to an in-memory transport whose log is
/// returned so the caller can show what would have printed.
pub fn build_state(config_path: Option<PathBuf>, dry_run: bool) -> AppResult<(AppState, Option<OpLog>)> {
    let path = config_path.or_else(PosConfig::default_config_path);
    let config = PosConfig::load(path.clone())?;
    info!(backend = %config.backend.url, dry_run, "Starting Comanda terminal");

    let auth = Arc::new(GoTrueAuth::new(&config.backend)?);
    let secure = Arc::new(KeyringStore::new());

    let (transport, log): (Box<dyn comanda_print::PrinterTransport>, Option<OpLog>) = if dry_run {
        let transport = RecordingTransport::new();
        let log = transport.log();
        (Box::new(transport), Some(log))
    } else {
        let serial = SerialConfig {
            connect_timeout: config.printer.connect_timeout(),
            ..SerialConfig::default()
        };
        (Box::new(SerialTransport::new(serial)), None)
    };

    let state = AppState::new(
        ConfigState::new(config, path),
        auth,
        secure,
        transport,
        permission_gate(dry_run),
    )?;
    Ok((state, log))
}

/// A dry run never opens a device node, so it gets no device checks.
fn permission_gate(dry_run: bool) -> Arc<dyn PermissionGate> {
    if dry_run {
        Arc::new(AllowAll)
    } else {
        Arc::new(DevicePermissionGate)
    }
}
