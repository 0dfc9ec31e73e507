//! # Terminal Configuration
//!
//! Backend, printer and cache settings for one POS terminal.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults          PosConfig::default()                              │
//! │  2. Config file       ~/.config/comanda/pos.toml  (or --config path)    │
//! │  3. Environment       COMANDA_BACKEND_URL, COMANDA_ANON_KEY,            │
//! │                       COMANDA_PRINTER_ADDRESS, COMANDA_LINE_WIDTH,      │
//! │                       COMANDA_STORE_ID                                  │
//! │  4. validate()        http(s) URL, anon key present, line width 32..=64 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

pub const MIN_LINE_WIDTH: usize = 32;
pub const MAX_LINE_WIDTH: usize = 64;

// =============================================================================
// Backend
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: String,

    /// Public anon key sent as `apikey` on every request.
    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            url: String::new(),
            anon_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Printer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterSettings {
    /// Fallback printer address when the store has none configured.
    #[serde(default)]
    pub address: Option<String>,

    /// Characters per line: 48 for 80 mm paper, 32 for 58 mm.
    #[serde(default = "default_line_width")]
    pub line_width: usize,

    /// PNG or JPEG printed at the top of every ticket.
    #[serde(default)]
    pub logo_path: Option<PathBuf>,

    #[serde(default = "default_feed_lines")]
    pub feed_lines: u8,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_line_width() -> usize {
    48
}

fn default_feed_lines() -> u8 {
    3
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for PrinterSettings {
    fn default() -> Self {
        PrinterSettings {
            address: None,
            line_width: default_line_width(),
            logo_path: None,
            feed_lines: default_feed_lines(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl PrinterSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// =============================================================================
// Cache / Store
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Seconds a cached query result stays fresh.
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
}

fn default_stale_secs() -> u64 {
    30
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            stale_secs: default_stale_secs(),
        }
    }
}

impl CacheSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Pins the terminal to a store instead of the user's first membership.
    #[serde(default)]
    pub id: Option<String>,
}

// =============================================================================
// PosConfig
// =============================================================================

/// Complete terminal configuration.
///
/// ## Example pos.toml
/// ```toml
/// [backend]
/// url = "https://xyz.supabase.co"
/// anon_key = "eyJhbGciOi..."
/// request_timeout_secs = 15
///
/// [printer]
/// line_width = 48
/// logo_path = "/etc/comanda/logo.png"
/// feed_lines = 3
///
/// [cache]
/// stale_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub printer: PrinterSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns the defaults if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.backend.url.trim();
        if url.is_empty() {
            return Err(ClientError::InvalidConfig("backend.url is required".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "Backend URL must start with http:// or https://, got: {}",
                url
            )));
        }
        url::Url::parse(url)?;

        if self.backend.anon_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig("backend.anon_key is required".into()));
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if !(MIN_LINE_WIDTH..=MAX_LINE_WIDTH).contains(&self.printer.line_width) {
            return Err(ClientError::InvalidConfig(format!(
                "printer.line_width must be between {} and {}, got {}",
                MIN_LINE_WIDTH, MAX_LINE_WIDTH, self.printer.line_width
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("COMANDA_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.url = url;
        }

        if let Ok(key) = std::env::var("COMANDA_ANON_KEY") {
            self.backend.anon_key = key;
        }

        if let Ok(address) = std::env::var("COMANDA_PRINTER_ADDRESS") {
            debug!(address = %address, "Overriding printer address from environment");
            self.printer.address = Some(address);
        }

        if let Ok(width) = std::env::var("COMANDA_LINE_WIDTH") {
            match width.parse::<usize>() {
                Ok(w) => self.printer.line_width = w,
                Err(_) => warn!(value = %width, "Ignoring non-numeric COMANDA_LINE_WIDTH"),
            }
        }

        if let Ok(id) = std::env::var("COMANDA_STORE_ID") {
            self.store.id = Some(id);
        }
    }

    /// `~/.config/comanda/pos.toml` on Linux, the platform equivalent elsewhere.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "comanda", "comanda")
            .map(|dirs| dirs.config_dir().join("pos.toml"))
    }

    /// Printer address from the config, ignoring blanks.
    pub fn printer_address(&self) -> Option<&str> {
        self.printer
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}
