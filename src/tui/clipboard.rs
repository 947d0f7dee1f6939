//! Clipboard export of the insight log
//!
//! Uses `arboard` for cross-platform support (Windows, macOS, Linux).
//! The clipboard is created fresh each time to avoid holding resources.

use crate::session::InsightLog;
use anyhow::{Context, Result};
use arboard::Clipboard;

/// Copy text to the system clipboard
///
/// Common failure cases: no display server (headless Linux), permission denied.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(text)
        .context("Failed to set clipboard text")?;
    Ok(())
}

/// Plain-text rendering of the log, newest first, one entry per line
pub fn format_insight_log(log: &InsightLog) -> String {
    log.iter()
        .map(|entry| entry.to_line())
        .collect::<Vec<_>>()
        .join("\n")
}
