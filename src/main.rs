// healdash - terminal dashboard for a dataset healing service
//
// Uploads a CSV to the analysis service, shows the returned diagnostics and
// lets the user refine the feature set and target, recording how each
// recalibration moved the model's accuracy.
//
// Architecture:
// - Session: single-writer state machine (file, report, selection, insight log)
// - Service: blocking HTTP client behind the AnalysisService trait
// - TUI (ratatui): renders the session, runs service calls on the blocking pool
// - CLI: headless analyze / download / config commands

mod cli;
mod config;
mod logging;
mod service;
mod session;
mod tui;
mod util;

use anyhow::{bail, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use logging::{LogBuffer, LogSink};
use service::{AnalysisService, HttpAnalysisService};
use std::sync::Arc;

// Not #[tokio::main]: the blocking reqwest client panics when created,
// used or dropped on an async thread. Only the TUI needs a runtime.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    // Load configuration first to determine TUI vs headless mode
    let config = Config::from_env();

    // Subcommands always log to stderr; their stdout is the result
    if let Some(command) = cli.command {
        let _file_guard = logging::init(&config.logging, LogSink::Stderr);
        return cli::run_command(command, &config);
    }

    if !config.enable_tui {
        let _file_guard = logging::init(&config.logging, LogSink::Stderr);
        let Some(file) = cli.file else {
            bail!("TUI disabled (HEALDASH_NO_TUI); pass --file or use `healdash analyze FILE`");
        };
        let service = HttpAnalysisService::from_config(&config)?;
        return cli::handle_analyze(&service, &file, None, &[], false);
    }

    // In TUI mode logs go to the in-app panel, never the terminal
    let log_buffer = LogBuffer::new();
    let _file_guard = logging::init(&config.logging, LogSink::Tui(log_buffer.clone()));

    tracing::info!("healdash v{} starting", config::VERSION);
    let service: Arc<dyn AnalysisService> = Arc::new(HttpAnalysisService::from_config(&config)?);

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(tui::run_tui(config, log_buffer, &service, cli.file));

    // Abandoned jobs still hold the client; let them go before it drops here
    runtime.shutdown_background();
    result
}
