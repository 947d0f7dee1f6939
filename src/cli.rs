// CLI module - command-line argument parsing and headless handlers
//
// Without a subcommand the dashboard TUI starts. Subcommands:
// - analyze: one-shot upload (+ optional recalibration), printed to stdout
// - download: analyze a dataset, then fetch its cleaned version
// - config: show / reset / locate the config file

use crate::config::{Config, VERSION};
use crate::service::{save_cleaned, AnalysisService, HttpAnalysisService, SourceFile};
use crate::session::{Report, Session};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

/// healdash - interactive front end for the dataset healing service
#[derive(Parser, Debug)]
#[command(name = "healdash")]
#[command(version = VERSION)]
#[command(about = "Upload a dataset, inspect diagnostics and recalibrate the model", long_about = None)]
pub struct Cli {
    /// Dataset to upload when the dashboard starts
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a dataset without the dashboard
    Analyze {
        /// CSV file to upload
        file: PathBuf,

        /// Recalibrate with this target column
        #[arg(long)]
        target: Option<String>,

        /// Exclude a feature column before recalibrating (repeatable)
        #[arg(long = "drop", value_name = "COLUMN")]
        drop: Vec<String>,

        /// Print the session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze a dataset and save the cleaned version the service produced
    Download {
        /// CSV file to upload
        file: PathBuf,

        /// Output path (default: <download_dir>/cleaned_<name>.csv)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Run a headless subcommand
pub fn run_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Analyze {
            file,
            target,
            drop,
            json,
        } => {
            let service = HttpAnalysisService::from_config(config)?;
            handle_analyze(&service, &file, target.as_deref(), &drop, json)
        }
        Commands::Download { file, out } => {
            let service = HttpAnalysisService::from_config(config)?;
            let (out, written) = handle_download(&service, &file, out, &config.download_dir)?;
            println!("Saved {} bytes to {}", written, out.display());
            Ok(())
        }
        Commands::Config { show, reset, path } => {
            if path {
                handle_config_path()
            } else if show {
                handle_config_show(config);
                Ok(())
            } else if reset {
                handle_config_reset()
            } else {
                println!("Usage: healdash config [--show|--reset|--path]");
                Ok(())
            }
        }
    }
}

/// Upload, optionally adjust the selection and recalibrate once, then print
pub fn handle_analyze(
    service: &dyn AnalysisService,
    file: &Path,
    target: Option<&str>,
    drop: &[String],
    json: bool,
) -> Result<()> {
    let source = SourceFile::read(file)?;
    let mut session = Session::new();
    session
        .upload_file(service, source)
        .with_context(|| format!("Analysis of {} failed", file.display()))?;

    let mut refine = false;
    if let Some(target) = target {
        if !session.change_target(target) {
            bail!("Column '{}' is not part of the report", target);
        }
        refine = true;
    }
    for column in drop {
        if session.is_selected(column) {
            session.toggle_column(column);
            refine = true;
        } else {
            tracing::warn!("Column {} is not selected; nothing to drop", column);
        }
    }
    if refine {
        session
            .request_recalibration(service)
            .context("Recalibration failed")?;
    }

    if json {
        let snapshot = serde_json::to_string_pretty(&session.snapshot())?;
        println!("{}", snapshot);
    } else {
        print_summary(&session);
    }
    Ok(())
}

fn print_summary(session: &Session) {
    let Some(report) = session.report() else {
        return;
    };
    println!("{}", format_report_summary(report));
    println!(
        "Features ({}): {}",
        session.selected_columns().len(),
        session.selected_columns().join(", ")
    );
    println!();
    println!("Insights (newest first):");
    for entry in session.insight_log().iter() {
        println!("  {}", entry.to_line());
    }
}

/// Multi-line headline block for a report
pub fn format_report_summary(report: &Report) -> String {
    let mut out = format!(
        "Target:    {}\nAccuracy:  {}\nRows:      {}\nMissing:   {} -> {}\nHealed:    {}",
        report.stats.target_used,
        report.accuracy_label(),
        report.stats.rows,
        report.stats.missing_before,
        report.stats.missing_after,
        report.total_healed()
    );
    if report.leakage_suspected() {
        out.push_str("\nWarning:   near-perfect accuracy, check for target leakage");
    }
    out
}

/// Analyze `file`, then save the cleaned artifact.
///
/// The service only cleans what it has just analyzed, so the download always
/// follows a successful analysis in the same session.
pub fn handle_download(
    service: &dyn AnalysisService,
    file: &Path,
    out: Option<PathBuf>,
    download_dir: &Path,
) -> Result<(PathBuf, usize)> {
    let source = SourceFile::read(file)?;
    let mut session = Session::new();
    session
        .upload_file(service, source)
        .with_context(|| format!("Analysis of {} failed", file.display()))?;
    session.ensure_downloadable()?;

    let out = out.unwrap_or_else(|| download_dir.join(session.download_file_name()));
    let written = write_download(service, &out)?;
    Ok((out, written))
}

/// Fetch the cleaned artifact and write it to `out`; returns bytes written
pub fn write_download(service: &dyn AnalysisService, out: &Path) -> Result<usize> {
    save_cleaned(service, out).with_context(|| format!("Download to {} failed", out.display()))
}

fn handle_config_path() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show(config: &Config) {
    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    if let Some(path) = Config::config_path() {
        println!();
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, Config::default().to_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}
