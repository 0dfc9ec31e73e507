//! Secure key/value storage for the session blob and the remembered printer.
//!
//! Production uses the OS credential store through `keyring` (Keychain on
//! macOS, the Windows credential manager, kernel keyutils on Linux). Values
//! are opaque strings; callers serialize to JSON.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::ClientResult;

/// Serialized [`crate::session::Session`].
pub const AUTH_KEY: &str = "comanda.auth";

/// Address of the last printer that printed successfully.
pub const PRINTER_KEY: &str = "comanda.printer";

const SERVICE_NAME: &str = "comanda-pos";

/// Storage seam for secrets.
pub trait SecureStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> ClientResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> ClientResult<()>;
}

// =============================================================================
// OS keyring
// =============================================================================

#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        KeyringStore {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> ClientResult<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStore for KeyringStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                warn!(key, error = %e, "keyring: failed to read credential");
                Err(e.into())
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entry(key)?.set_password(value)?;
        debug!(key, "keyring: credential stored");
        Ok(())
    }

    fn delete(&self, key: &str) -> ClientResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local store for tests and `--dry-run`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SecureStore for MemoryStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> ClientResult<()> {
        self.values().remove(key);
        Ok(())
    }
}
