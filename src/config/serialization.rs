//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Generate complete TOML config from current values
    pub fn to_toml(&self) -> String {
        format!(
            r#"# healdash configuration

# Analysis service base URL (env: HEALDASH_SERVICE_URL)
service_url = "{service_url}"

# Seconds before an analysis request is abandoned (env: HEALDASH_TIMEOUT)
request_timeout_secs = {timeout}

# Where cleaned datasets are saved (env: HEALDASH_DOWNLOAD_DIR)
download_dir = "{download_dir}"

# Dashboard
[tui]
tick_rate_ms = {tick}
toast_secs = {toast}
preview_rows = {preview}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to TUI buffer or stderr)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            service_url = self.service_url,
            timeout = self.request_timeout_secs,
            download_dir = toml_path(&self.download_dir),
            tick = self.tui.tick_rate_ms,
            toast = self.tui.toast_secs,
            preview = self.tui.preview_rows,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = toml_path(&self.logging.file_dir),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
        )
    }
}

/// Paths go into basic strings, so backslashes (Windows) must be escaped
fn toml_path(path: &std::path::Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}
