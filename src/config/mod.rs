//! Configuration for the dashboard
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/healdash/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod serialization;


pub use logging::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

// ─────────────────────────────────────────────────────────────────────────────
// TUI settings
// ─────────────────────────────────────────────────────────────────────────────

/// Dashboard rendering settings
#[derive(Debug, Clone, PartialEq)]
pub struct TuiConfig {
    /// Redraw interval in milliseconds (drives the busy spinner)
    pub tick_rate_ms: u64,
    /// How long informational toasts stay up
    pub toast_secs: u64,
    /// Maximum preview rows shown under the diagnostics table
    pub preview_rows: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 200,
            toast_secs: 3,
            preview_rows: 10,
        }
    }
}

/// TUI settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileTui {
    pub tick_rate_ms: Option<u64>,
    pub toast_secs: Option<u64>,
    pub preview_rows: Option<usize>,
}

impl TuiConfig {
    pub fn from_file(file: Option<FileTui>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            // A zero tick would spin the event loop
            tick_rate_ms: file.tick_rate_ms.unwrap_or(defaults.tick_rate_ms).max(16),
            toast_secs: file.toast_secs.unwrap_or(defaults.toast_secs),
            preview_rows: file.preview_rows.unwrap_or(defaults.preview_rows),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the analysis service
    pub service_url: String,

    /// Per-request timeout; an expired request surfaces as a transport failure
    pub request_timeout_secs: u64,

    /// Where downloaded cleaned datasets are written
    pub download_dir: PathBuf,

    /// Whether to run the TUI (env only; headless commands ignore it)
    pub enable_tui: bool,

    /// Dashboard settings
    pub tui: TuiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            enable_tui: true,
            tui: TuiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub service_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub download_dir: Option<String>,

    /// Optional [tui] section
    pub tui: Option<FileTui>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/healdash/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("healdash").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// A config file that exists but cannot be read or parsed is fatal: the
    /// process exits with a message pointing at the file.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::parse_file_config(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\nCONFIG ERROR - Failed to parse configuration file\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  Check quoting, true/false values and section names.");
                    eprintln!("  To reset, run `healdash config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\nCONFIG ERROR - Cannot read configuration file\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    pub(crate) fn parse_file_config(contents: &str) -> Result<FileConfig, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        Self::from_file_config(Self::load_file_config())
    }

    /// Merge a parsed file config with environment overrides
    pub(crate) fn from_file_config(file: FileConfig) -> Self {
        let service_url = std::env::var("HEALDASH_SERVICE_URL")
            .ok()
            .or(file.service_url)
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let request_timeout_secs = std::env::var("HEALDASH_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);

        let download_dir = std::env::var("HEALDASH_DOWNLOAD_DIR")
            .ok()
            .or(file.download_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

        // TUI toggle: env only (runtime flag)
        let enable_tui = std::env::var("HEALDASH_NO_TUI")
            .map(|v| v != "1" && v.to_lowercase() != "true")
            .unwrap_or(true);

        Self {
            service_url,
            request_timeout_secs,
            download_dir,
            enable_tui,
            tui: TuiConfig::from_file(file.tui),
            logging: LoggingConfig::from_file(file.logging),
        }
    }
}
