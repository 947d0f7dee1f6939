// App state - everything the dashboard needs between frames
//
// The App wraps the Session and adds purely presentational state: modal,
// toast, panel cursor, spinner frame, theme. Key handling never performs I/O
// itself; operations that need the network return a `Job` for the event loop
// to run off the UI thread, and the outcome comes back as a `Reply`.

use super::clipboard;
use super::components::toast::Toast;
use super::modal::{Modal, ModalAction};
use super::theme::{Theme, ThemeKind};
use crate::config::{Config, TuiConfig};
use crate::logging::LogBuffer;
use crate::service::{AnalysisRequest, ServiceError, SourceFile};
use crate::session::{Panel, Report, Session, SessionError};
use crossterm::event::KeyCode;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Blocking work the event loop runs on the thread pool
#[derive(Debug)]
pub enum Job {
    Upload(AnalysisRequest),
    Recalibrate(AnalysisRequest),
    Download { path: PathBuf },
}

/// Outcome of a finished `Job`
#[derive(Debug)]
pub enum Reply {
    Upload(Result<Report, ServiceError>),
    Recalibrate(Result<Report, ServiceError>),
    /// Path written and byte count
    Download(Result<(PathBuf, usize), ServiceError>),
}

/// One selectable row of the open panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelItem {
    pub identifier: String,
    /// Checked in the feature picker, current in the target picker
    pub marked: bool,
    /// Importance score (importance panel only)
    pub score: Option<f64>,
}

pub struct App {
    pub session: Session,
    pub log_buffer: LogBuffer,
    pub settings: TuiConfig,
    pub download_dir: PathBuf,
    pub service_url: String,

    pub modal: Option<Modal>,
    pub toast: Option<Toast>,
    pub theme_kind: ThemeKind,
    pub theme: Theme,

    /// Highlighted row in the open panel
    pub cursor: usize,
    pub spinner_frame: usize,
    /// Download in flight; shares the session's one-request-at-a-time rule
    pub downloading: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config, log_buffer: LogBuffer) -> Self {
        let theme_kind = ThemeKind::default();
        Self {
            session: Session::new(),
            log_buffer,
            settings: config.tui.clone(),
            download_dir: config.download_dir.clone(),
            service_url: config.service_url.clone(),
            modal: None,
            toast: None,
            theme_kind,
            theme: theme_kind.theme(),
            cursor: 0,
            spinner_frame: 0,
            downloading: false,
            should_quit: false,
        }
    }

    /// Advance animations and expire the toast
    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }
    }

    pub fn spinner(&self) -> char {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(
            message,
            Duration::from_secs(self.settings.toast_secs),
        ));
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.modal = Some(Modal::error(message));
    }

    fn cycle_theme(&mut self) {
        self.theme_kind = self.theme_kind.next();
        self.theme = self.theme_kind.theme();
        self.show_toast(format!("Theme: {}", self.theme_kind.name()));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────

    /// Layered dispatch: Modal → open panel → global keys
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Job> {
        if let Some(modal) = self.modal.as_mut() {
            return match modal.handle_input(key) {
                ModalAction::None => None,
                ModalAction::Close => {
                    self.modal = None;
                    None
                }
                ModalAction::Submit(path) => {
                    self.modal = None;
                    self.open_file(Path::new(&path))
                }
            };
        }

        if let Some(panel) = self.session.active_panel() {
            if self.handle_panel_key(panel, key) {
                return None;
            }
        }

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('?') => {
                self.modal = Some(Modal::Help);
                None
            }
            KeyCode::Char('o') => {
                self.modal = Some(Modal::open_file());
                None
            }
            KeyCode::Char('t') => {
                self.toggle_panel(Panel::TargetPicker);
                None
            }
            KeyCode::Char('f') => {
                self.toggle_panel(Panel::FeaturePicker);
                None
            }
            KeyCode::Char('i') => {
                self.toggle_panel(Panel::Importance);
                None
            }
            KeyCode::Char('r') => self.recalibrate(),
            KeyCode::Char('d') => self.download(),
            KeyCode::Char('y') => {
                self.copy_insights();
                None
            }
            KeyCode::Char('c') => {
                self.cycle_theme();
                None
            }
            _ => None,
        }
    }

    /// Keys that only mean something while a panel is open.
    /// Returns true when consumed.
    fn handle_panel_key(&mut self, panel: Panel, key: KeyCode) -> bool {
        let len = self.panel_items().len();
        match key {
            KeyCode::Esc => {
                self.session.close_panel();
                true
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
                true
            }
            KeyCode::Char(' ') if panel == Panel::FeaturePicker => {
                self.toggle_under_cursor();
                true
            }
            KeyCode::Enter => {
                match panel {
                    Panel::TargetPicker => self.commit_target_under_cursor(),
                    Panel::FeaturePicker => self.toggle_under_cursor(),
                    Panel::Importance => self.session.close_panel(),
                }
                true
            }
            _ => false,
        }
    }

    fn toggle_panel(&mut self, panel: Panel) {
        self.session.toggle_panel(panel);
        self.cursor = 0;
        if self.session.active_panel() == Some(Panel::TargetPicker) {
            // Start on the current target
            if let Some(pos) = self.panel_items().iter().position(|item| item.marked) {
                self.cursor = pos;
            }
        }
    }

    fn toggle_under_cursor(&mut self) {
        if let Some(item) = self.panel_items().get(self.cursor) {
            let id = item.identifier.clone();
            self.session.toggle_column(&id);
        }
    }

    fn commit_target_under_cursor(&mut self) {
        let Some(item) = self.panel_items().get(self.cursor).cloned() else {
            return;
        };
        if self.session.change_target(&item.identifier) {
            self.cursor = 0;
            self.show_toast(format!("Target: {} (press r to recalibrate)", item.identifier));
        }
    }

    /// Rows of the open panel, in display order
    pub fn panel_items(&self) -> Vec<PanelItem> {
        let (Some(panel), Some(report)) = (self.session.active_panel(), self.session.report())
        else {
            return Vec::new();
        };
        let target = self.session.selected_target();

        match panel {
            Panel::TargetPicker => report
                .column_ids()
                .map(|id| PanelItem {
                    identifier: id.to_string(),
                    marked: target == Some(id),
                    score: None,
                })
                .collect(),
            Panel::FeaturePicker => report
                .column_ids()
                .filter(|id| target != Some(*id))
                .map(|id| PanelItem {
                    identifier: id.to_string(),
                    marked: self.session.is_selected(id),
                    score: None,
                })
                .collect(),
            Panel::Importance => report
                .ranked_importance()
                .into_iter()
                .map(|(id, score)| PanelItem {
                    identifier: id.to_string(),
                    marked: self.session.is_selected(id),
                    score: Some(score),
                })
                .collect(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Read `path` and start analysing it
    pub fn open_file(&mut self, path: &Path) -> Option<Job> {
        match SourceFile::read(path) {
            Ok(file) => self.start_upload(file),
            Err(e) => {
                tracing::error!("Could not open {}: {}", path.display(), e);
                self.show_error(e.to_string());
                None
            }
        }
    }

    pub fn start_upload(&mut self, file: SourceFile) -> Option<Job> {
        if self.downloading {
            self.report_error(SessionError::Busy);
            return None;
        }
        match self.session.begin_upload(file) {
            Ok(request) => Some(Job::Upload(request)),
            Err(e) => {
                self.report_error(e);
                None
            }
        }
    }

    /// Refused while a download is in flight
    pub fn recalibrate(&mut self) -> Option<Job> {
        if self.downloading {
            self.report_error(SessionError::Busy);
            return None;
        }
        match self.session.begin_recalibration() {
            Ok(request) => Some(Job::Recalibrate(request)),
            Err(e) => {
                self.report_error(e);
                None
            }
        }
    }

    pub fn download(&mut self) -> Option<Job> {
        if self.downloading {
            self.show_toast("Download already running");
            return None;
        }
        if let Err(e) = self.session.ensure_downloadable() {
            self.report_error(e);
            return None;
        }
        self.downloading = true;
        let path = self.download_dir.join(self.session.download_file_name());
        Some(Job::Download { path })
    }

    fn copy_insights(&mut self) {
        let text = clipboard::format_insight_log(self.session.insight_log());
        if text.is_empty() {
            self.show_toast("Insight log is empty");
            return;
        }
        match clipboard::copy_to_clipboard(&text) {
            Ok(()) => self.show_toast("Insight log copied"),
            Err(e) => {
                tracing::warn!("Clipboard copy failed: {:#}", e);
                self.show_toast("Clipboard unavailable");
            }
        }
    }

    /// Apply a finished job to the session
    pub fn apply_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Upload(outcome) => match self.session.complete_upload(outcome) {
                Ok(()) => {
                    self.cursor = 0;
                    let name = self
                        .session
                        .file()
                        .map(|f| f.name().to_string())
                        .unwrap_or_default();
                    self.show_toast(format!("Analysis ready: {}", name));
                }
                Err(e) => self.report_error(e),
            },
            Reply::Recalibrate(outcome) => match self.session.complete_recalibration(outcome) {
                Ok(entry) => {
                    let message = format!("{} {}", entry.trend, entry.diff_label);
                    self.show_toast(message);
                }
                Err(e) => self.report_error(e),
            },
            Reply::Download(outcome) => {
                self.downloading = false;
                match outcome {
                    Ok((path, bytes)) => {
                        tracing::info!("Saved {} bytes to {}", bytes, path.display());
                        self.show_toast(format!("Saved {}", path.display()));
                    }
                    Err(e) => {
                        tracing::error!("Download failed: {}", e);
                        self.show_error(format!("Download failed: {}", e));
                    }
                }
            }
        }
    }

    /// Blocking modal for user-facing errors, toast for dropped requests
    fn report_error(&mut self, error: SessionError) {
        if error.is_user_facing() {
            self.show_error(error.to_string());
        } else {
            tracing::debug!("{}", error);
            self.show_toast(error.to_string());
        }
    }
}
