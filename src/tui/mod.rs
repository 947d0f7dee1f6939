// TUI module - Terminal User Interface
//
// This module manages the dashboard using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, finished jobs)
// - Running service calls off the UI thread
//
// The service client is blocking, so every `Job` runs on tokio's blocking
// pool and reports back through an mpsc channel. The session therefore only
// ever sees one writer: this loop.

pub mod app;
pub mod clipboard;
pub mod components;
pub mod layout;
pub mod modal;
pub mod theme;
pub mod ui;

use crate::config::Config;
use crate::logging::LogBuffer;
use crate::service::{save_cleaned, AnalysisService, ServiceError};
use anyhow::{Context, Result};
use app::{App, Job, Reply};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// At most one job runs at a time, so a small buffer is plenty
const REPLY_CHANNEL_CAPACITY: usize = 8;

/// Run the TUI
///
/// Sets up the terminal, optionally starts analysing `initial_file`, runs the
/// event loop and restores the terminal when done.
pub async fn run_tui(
    config: Config,
    log_buffer: LogBuffer,
    service: &Arc<dyn AnalysisService>,
    initial_file: Option<PathBuf>,
) -> Result<()> {
    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(&config, log_buffer);
    let (reply_tx, mut reply_rx) = mpsc::channel(REPLY_CHANNEL_CAPACITY);

    tracing::info!("Dashboard started against {} ({})", config.service_url, service.name());
    if let Some(path) = initial_file {
        if let Some(job) = app.open_file(&path) {
            spawn_job(service, job, &reply_tx);
        }
    }

    let result = run_event_loop(
        &mut terminal,
        &mut app,
        service,
        &reply_tx,
        &mut reply_rx,
        Duration::from_millis(config.tui.tick_rate_ms),
    )
    .await;

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Handles three kinds of events:
/// 1. Keyboard input (may produce a job)
/// 2. Timer ticks (spinner, toast expiry)
/// 3. Finished jobs (applied to the session)
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    service: &Arc<dyn AnalysisService>,
    reply_tx: &mpsc::Sender<Reply>,
    reply_rx: &mut mpsc::Receiver<Reply>,
    tick_rate: Duration,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(tick_rate);

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            // Keyboard input
            job = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        return handle_key_event(app, key_event);
                    }
                }
                None
            } => {
                if let Some(job) = job {
                    spawn_job(service, job, reply_tx);
                }
            }

            _ = tick_interval.tick() => {
                app.tick();
            }

            Some(reply) = reply_rx.recv() => {
                app.apply_reply(reply);
            }
        }

        if app.should_quit {
            if app.session.is_busy() {
                tracing::info!("Quitting with a request in flight; its result is discarded");
            }
            break;
        }
    }

    Ok(())
}

fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Option<Job> {
    // Ignore release/repeat events (Windows reports both)
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        app.should_quit = true;
        return None;
    }
    app.handle_key(key_event.code)
}

/// Which reply a job produces, kept so a crashed worker still releases the
/// session
#[derive(Debug, Clone, Copy)]
enum JobKind {
    Upload,
    Recalibrate,
    Download,
}

impl JobKind {
    fn of(job: &Job) -> Self {
        match job {
            Job::Upload(_) => JobKind::Upload,
            Job::Recalibrate(_) => JobKind::Recalibrate,
            Job::Download { .. } => JobKind::Download,
        }
    }

    fn failed(self, error: ServiceError) -> Reply {
        match self {
            JobKind::Upload => Reply::Upload(Err(error)),
            JobKind::Recalibrate => Reply::Recalibrate(Err(error)),
            JobKind::Download => Reply::Download(Err(error)),
        }
    }
}

/// Run `job` on the blocking pool and send its reply back to the loop
fn spawn_job(service: &Arc<dyn AnalysisService>, job: Job, reply_tx: &mpsc::Sender<Reply>) {
    let service = Arc::clone(service);
    let reply_tx = reply_tx.clone();
    let kind = JobKind::of(&job);

    tokio::spawn(async move {
        let reply = tokio::task::spawn_blocking(move || run_job(service.as_ref(), job))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Worker for {:?} job died: {}", kind, e);
                kind.failed(ServiceError::Io(format!("worker failed: {}", e)))
            });

        if reply_tx.send(reply).await.is_err() {
            tracing::debug!("Dashboard closed before {:?} job finished", kind);
        }
    });
}

fn run_job(service: &dyn AnalysisService, job: Job) -> Reply {
    match job {
        Job::Upload(request) => Reply::Upload(service.analyze(&request)),
        Job::Recalibrate(request) => Reply::Recalibrate(service.analyze(&request)),
        Job::Download { path } => {
            Reply::Download(save_cleaned(service, &path).map(|bytes| (path, bytes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{AnalysisRequest, SourceFile};
    use crate::session::Report;

    struct EchoService;

    impl AnalysisService for EchoService {
        fn name(&self) -> &str {
            "echo"
        }

        fn analyze(&self, request: &AnalysisRequest) -> Result<Report, ServiceError> {
            let body = serde_json::json!({
                "stats": {"accuracy": 0.7, "target_used": request.target_column},
                "analysis": {"column_diagnostics": [{"value": "a"}, {"value": "y"}]}
            });
            Report::from_json(body.to_string().as_bytes())
                .map_err(|e| ServiceError::Decode(e.to_string()))
        }

        fn download_cleaned(&self) -> Result<Vec<u8>, ServiceError> {
            Err(ServiceError::Api {
                status: 404,
                message: "nothing cleaned yet".into(),
            })
        }
    }

    #[test]
    fn test_run_job_maps_to_matching_reply() {
        let request = AnalysisRequest {
            file: SourceFile::new("a.csv", b"a,y".to_vec()),
            selected_columns: Vec::new(),
            target_column: None,
        };
        match run_job(&EchoService, Job::Upload(request)) {
            Reply::Upload(Ok(report)) => assert_eq!(report.stats.target_used, "y"),
            other => panic!("unexpected reply: {:?}", other),
        }

        let path = std::env::temp_dir().join("healdash-never-written.csv");
        match run_job(&EchoService, Job::Download { path: path.clone() }) {
            Reply::Download(Err(ServiceError::Api { status, .. })) => assert_eq!(status, 404),
            other => panic!("unexpected reply: {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_worker_reply_matches_job() {
        let reply = JobKind::Recalibrate.failed(ServiceError::Io("boom".into()));
        assert!(matches!(reply, Reply::Recalibrate(Err(_))));
    }

    #[tokio::test]
    async fn test_spawned_job_reports_back() {
        let service: Arc<dyn AnalysisService> = Arc::new(EchoService);
        let (tx, mut rx) = mpsc::channel(1);
        let request = AnalysisRequest {
            file: SourceFile::new("a.csv", b"a,y".to_vec()),
            selected_columns: vec!["a".into()],
            target_column: Some("y".into()),
        };
        spawn_job(&service, Job::Recalibrate(request), &tx);

        match rx.recv().await {
            Some(Reply::Recalibrate(Ok(report))) => {
                assert_eq!(report.accuracy_label(), "70.0%")
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
