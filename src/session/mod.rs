//! Session controller
//!
//! The `Session` owns everything the dashboard shows: the uploaded file, the
//! active report, the feature/target selection, the insight log, the busy
//! flag and which auxiliary panel is open. It is the only writer of that
//! state; callers drive it through the operations below.
//!
//! # Lifecycle
//!
//! ```text
//! Empty ──begin_upload──▶ Analyzing ──ok──▶ Ready ◀──ok/err── Recalibrating
//!   ▲                        │                 │                    ▲
//!   └────────err─────────────┘                 └─begin_recalibration┘
//! ```
//!
//! Network operations come in two halves (`begin_*` hands out the request,
//! `complete_*` applies the outcome) so an event loop can keep rendering
//! while the request runs. `upload_file` and `request_recalibration` run both
//! halves synchronously against an `AnalysisService`.
//!
//! # Invariants
//!
//! - The selected target is never in `selected_columns`.
//! - At most one request is in flight; `begin_*` while busy is rejected
//!   without side effects.
//! - A failed request never installs a partial report or touches the log.

mod error;
mod insight;
mod report;

#[cfg(test)]
mod tests;

pub use error::{SessionError, Validation};
pub use insight::{
    evaluate, InsightLog, InsightLogEntry, Recalibration, Trend, INSIGHT_LOG_CAPACITY,
};
pub use report::Report;

use crate::service::{AnalysisRequest, AnalysisService, ServiceError, SourceFile};
use serde::Serialize;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    /// No file yet
    #[default]
    Empty,
    /// Initial upload in flight
    Analyzing,
    /// Report present, idle
    Ready,
    /// Refine request in flight
    Recalibrating,
}

/// Auxiliary panels; at most one is open at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Panel {
    TargetPicker,
    FeaturePicker,
    Importance,
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::TargetPicker => "Target",
            Panel::FeaturePicker => "Features",
            Panel::Importance => "Feature Importance",
        }
    }
}

/// What the session is waiting on
#[derive(Debug)]
enum InFlight {
    Upload {
        file: SourceFile,
    },
    Recalibration {
        /// Accuracy and selection size captured before the request went out
        prev_accuracy: f64,
        total_columns: usize,
        active_features: usize,
    },
}

/// Serializable view of the session for headless output
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub busy: bool,
    pub file: Option<String>,
    pub selected_columns: Vec<String>,
    pub selected_target: Option<String>,
    pub active_panel: Option<Panel>,
    pub report: Option<Report>,
    pub insight_log: InsightLog,
}

/// The single dashboard session
#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    file: Option<SourceFile>,
    report: Option<Report>,
    /// Insertion-ordered for display; membership is what matters
    selected_columns: Vec<String>,
    selected_target: Option<String>,
    insight_log: InsightLog,
    active_panel: Option<Panel>,
    in_flight: Option<InFlight>,
    next_entry_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read access
    // ─────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True exactly while a request is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Analyzing | Phase::Recalibrating)
    }

    pub fn file(&self) -> Option<&SourceFile> {
        self.file.as_ref()
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    pub fn is_selected(&self, identifier: &str) -> bool {
        self.selected_columns.iter().any(|c| c == identifier)
    }

    pub fn selected_target(&self) -> Option<&str> {
        self.selected_target.as_deref()
    }

    pub fn insight_log(&self) -> &InsightLog {
        &self.insight_log
    }

    pub fn active_panel(&self) -> Option<Panel> {
        self.active_panel
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            busy: self.is_busy(),
            file: self.file.as_ref().map(|f| f.name().to_string()),
            selected_columns: self.selected_columns.clone(),
            selected_target: self.selected_target.clone(),
            active_panel: self.active_panel,
            report: self.report.clone(),
            insight_log: self.insight_log.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Local mutations (no network)
    // ─────────────────────────────────────────────────────────────────────

    /// Flip membership of `identifier` in the feature set.
    ///
    /// The current target is never added; toggling it is ignored.
    pub fn toggle_column(&mut self, identifier: &str) {
        if self.selected_target.as_deref() == Some(identifier) {
            tracing::debug!("Ignoring toggle of target column {}", identifier);
            return;
        }

        if let Some(pos) = self.selected_columns.iter().position(|c| c == identifier) {
            self.selected_columns.remove(pos);
        } else {
            self.selected_columns.push(identifier.to_string());
        }
    }

    /// Make `identifier` the prediction target.
    ///
    /// Returns false (and changes nothing) when there is no report or the
    /// column is not part of it. Closes any open panel.
    pub fn change_target(&mut self, identifier: &str) -> bool {
        let Some(report) = &self.report else {
            return false;
        };
        if !report.has_column(identifier) {
            tracing::warn!("Unknown target column: {}", identifier);
            return false;
        }

        self.selected_target = Some(identifier.to_string());
        self.selected_columns.retain(|c| c != identifier);
        self.active_panel = None;
        tracing::debug!("Target set to {}", identifier);
        true
    }

    /// Open `panel`, or close it if it is already the open one
    pub fn toggle_panel(&mut self, panel: Panel) {
        self.active_panel = if self.active_panel == Some(panel) {
            None
        } else {
            Some(panel)
        };
    }

    pub fn close_panel(&mut self) {
        self.active_panel = None;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Upload
    // ─────────────────────────────────────────────────────────────────────

    /// Start analysing `file`. The file only replaces the current one once the
    /// analysis succeeds.
    pub fn begin_upload(&mut self, file: SourceFile) -> Result<AnalysisRequest, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }

        tracing::info!("Uploading {} ({} bytes)", file.name(), file.len());
        if file.is_empty() {
            tracing::warn!("{} is empty; the service will likely reject it", file.name());
        }
        let request = AnalysisRequest {
            file: file.clone(),
            selected_columns: Vec::new(),
            target_column: None,
        };
        self.in_flight = Some(InFlight::Upload { file });
        self.phase = Phase::Analyzing;
        Ok(request)
    }

    /// Apply the outcome of the request handed out by `begin_upload`
    pub fn complete_upload(
        &mut self,
        outcome: Result<Report, ServiceError>,
    ) -> Result<(), SessionError> {
        let file = match self.in_flight.take() {
            Some(InFlight::Upload { file }) => file,
            other => {
                self.in_flight = other;
                return Err(SessionError::NothingInFlight);
            }
        };

        match outcome {
            Ok(report) => {
                let target = report.stats.target_used.clone();
                self.selected_columns = report
                    .column_ids()
                    .filter(|id| *id != target)
                    .map(str::to_string)
                    .collect();
                self.selected_target = report.has_column(&target).then_some(target);

                let entry = InsightLogEntry::baseline(
                    self.next_id(),
                    self.selected_target.as_deref(),
                );
                self.insight_log.reset(entry);

                tracing::info!(
                    "Analysis ready for {}: accuracy {}, {} columns",
                    file.name(),
                    report.accuracy_label(),
                    report.column_diagnostics.len()
                );
                if report.leakage_suspected() {
                    tracing::warn!(
                        "Accuracy {} is near perfect; the target may be leaking into the features",
                        report.accuracy_label()
                    );
                }

                self.file = Some(file);
                self.report = Some(report);
                self.phase = Phase::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Analysis of {} failed: {}", file.name(), e);
                self.phase = self.idle_phase();
                Err(SessionError::Transport(e))
            }
        }
    }

    /// Upload and analyse synchronously
    pub fn upload_file(
        &mut self,
        service: &dyn AnalysisService,
        file: SourceFile,
    ) -> Result<(), SessionError> {
        let request = self.begin_upload(file)?;
        let outcome = service.analyze(&request);
        self.complete_upload(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Recalibration
    // ─────────────────────────────────────────────────────────────────────

    /// Start a recalibration with the current file and selection
    pub fn begin_recalibration(&mut self) -> Result<AnalysisRequest, SessionError> {
        if self.is_busy() {
            tracing::debug!("Recalibration dropped: request already in flight");
            return Err(SessionError::Busy);
        }
        let file = self.file.clone().ok_or(Validation::NoFile)?;
        let target = self.selected_target.clone().ok_or(Validation::NoTarget)?;

        let (prev_accuracy, total_columns) = self
            .report
            .as_ref()
            .map(|r| (r.stats.accuracy_pct, r.column_diagnostics.len()))
            .unwrap_or((f64::NAN, 0));

        let request = AnalysisRequest {
            file,
            selected_columns: self.selected_columns.clone(),
            target_column: Some(target),
        };

        tracing::info!(
            "Recalibrating: target {:?}, {} features",
            request.target_column,
            request.selected_columns.len()
        );

        self.in_flight = Some(InFlight::Recalibration {
            prev_accuracy,
            total_columns,
            active_features: request.selected_columns.len(),
        });
        self.phase = Phase::Recalibrating;
        Ok(request)
    }

    /// Apply the outcome of the request handed out by `begin_recalibration`.
    ///
    /// On success returns the new log entry (now at index 0).
    pub fn complete_recalibration(
        &mut self,
        outcome: Result<Report, ServiceError>,
    ) -> Result<&InsightLogEntry, SessionError> {
        let (prev_accuracy, total_columns, active_features) = match self.in_flight.take() {
            Some(InFlight::Recalibration {
                prev_accuracy,
                total_columns,
                active_features,
            }) => (prev_accuracy, total_columns, active_features),
            other => {
                self.in_flight = other;
                return Err(SessionError::NothingInFlight);
            }
        };

        self.phase = Phase::Ready;
        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Recalibration failed: {}", e);
                return Err(SessionError::Transport(e));
            }
        };

        let insight = evaluate(&Recalibration {
            prev_accuracy,
            new_accuracy: report.stats.accuracy_pct,
            total_columns,
            active_features,
        });
        tracing::info!(
            "Recalibration {}: {} (accuracy {})",
            insight.trend,
            insight.diff_label,
            report.accuracy_label()
        );

        let entry = InsightLogEntry::from_insight(self.next_id(), insight);
        self.insight_log.push_front(entry);
        self.report = Some(report);

        self.insight_log
            .latest()
            .ok_or(SessionError::NothingInFlight)
    }

    /// Recalibrate synchronously
    pub fn request_recalibration(
        &mut self,
        service: &dyn AnalysisService,
    ) -> Result<&InsightLogEntry, SessionError> {
        let request = self.begin_recalibration()?;
        let outcome = service.analyze(&request);
        self.complete_recalibration(outcome)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Download side channel
    // ─────────────────────────────────────────────────────────────────────

    /// Check that the cleaned artifact can be fetched: at least one
    /// successful analysis and nothing in flight.
    pub fn ensure_downloadable(&self) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if self.report.is_none() {
            return Err(Validation::NoReport.into());
        }
        Ok(())
    }

    /// File name for the downloaded artifact
    pub fn download_file_name(&self) -> String {
        let stem = self.file.as_ref().map_or("dataset", |f| f.stem());
        format!("cleaned_{}.csv", stem)
    }

    // ─────────────────────────────────────────────────────────────────────

    /// Phase to fall back to when a request fails
    fn idle_phase(&self) -> Phase {
        if self.report.is_some() {
            Phase::Ready
        } else {
            Phase::Empty
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_entry_id += 1;
        self.next_entry_id
    }
}
