//! Session controller tests
//!
//! Drive the controller against a scripted in-memory service and check the
//! selection invariants, the single-flight rule and failure isolation.

use super::*;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Service that replays scripted responses and records every request
#[derive(Default)]
struct ScriptedService {
    replies: Mutex<VecDeque<Result<Report, ServiceError>>>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl ScriptedService {
    fn with(replies: Vec<Result<Report, ServiceError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> AnalysisRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl AnalysisService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<Report, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Network("no scripted reply".into())))
    }

    fn download_cleaned(&self) -> Result<Vec<u8>, ServiceError> {
        Ok(b"a,b\n1,2\n".to_vec())
    }
}

/// Report over `columns` with the given accuracy (fraction) and target
fn report(accuracy: f64, columns: &[&str], target: &str) -> Report {
    let diagnostics: Vec<_> = columns
        .iter()
        .map(|c| json!({"value": c, "label": c, "type": "numeric", "cardinality": 10, "missing_pct": 0.0}))
        .collect();
    let body = json!({
        "stats": {
            "accuracy": accuracy,
            "rows": 100,
            "missing_before": 4,
            "missing_after": 0,
            "target_used": target
        },
        "analysis": {
            "column_diagnostics": diagnostics,
            "feature_importance": {},
            "health_data": {}
        },
        "preview_data": []
    });
    Report::from_json(body.to_string().as_bytes()).unwrap()
}

const COLUMNS: &[&str] = &["age", "fare", "class", "sex", "survived"];

fn file() -> SourceFile {
    SourceFile::new("titanic.csv", b"age,fare,class,sex,survived\n".to_vec())
}

/// Session that has completed one successful upload
fn ready_session(accuracy: f64) -> Session {
    let service = ScriptedService::with(vec![Ok(report(accuracy, COLUMNS, "survived"))]);
    let mut session = Session::new();
    session.upload_file(&service, file()).unwrap();
    session
}

fn assert_target_not_selected(session: &Session) {
    if let Some(target) = session.selected_target() {
        assert!(
            !session.is_selected(target),
            "target {} must not be in the feature set",
            target
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upload
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_new_session_is_empty() {
    let session = Session::new();
    assert_eq!(session.phase(), Phase::Empty);
    assert!(!session.is_busy());
    assert!(session.report().is_none());
    assert!(session.insight_log().is_empty());
}

#[test]
fn test_upload_derives_default_selection_and_baseline() {
    let service = ScriptedService::with(vec![Ok(report(0.82, COLUMNS, "survived"))]);
    let mut session = Session::new();
    session.upload_file(&service, file()).unwrap();

    assert_eq!(session.phase(), Phase::Ready);
    assert_eq!(session.selected_target(), Some("survived"));
    assert_eq!(session.selected_columns(), &["age", "fare", "class", "sex"]);
    assert_target_not_selected(&session);

    assert_eq!(session.insight_log().len(), 1);
    let baseline = session.insight_log().latest().unwrap();
    assert_eq!(baseline.trend, Trend::Init);
    assert_eq!(baseline.diff_label, "INIT");

    let request = service.last_request();
    assert!(request.selected_columns.is_empty());
    assert_eq!(request.target_column, None);
    assert_eq!(request.selected_columns_json(), "[]");
}

#[test]
fn test_busy_is_set_while_upload_in_flight() {
    let mut session = Session::new();
    let request = session.begin_upload(file()).unwrap();
    assert_eq!(request.file.name(), "titanic.csv");
    assert!(session.is_busy());
    assert_eq!(session.phase(), Phase::Analyzing);
    // File is not installed until the analysis succeeds
    assert!(session.file().is_none());

    session
        .complete_upload(Ok(report(0.8, COLUMNS, "survived")))
        .unwrap();
    assert!(!session.is_busy());
    assert_eq!(session.file().map(|f| f.name()), Some("titanic.csv"));
}

#[test]
fn test_failed_first_upload_returns_to_empty() {
    let service = ScriptedService::with(vec![Err(ServiceError::Api {
        status: 500,
        message: "boom".into(),
    })]);
    let mut session = Session::new();
    let err = session.upload_file(&service, file()).unwrap_err();

    assert!(matches!(err, SessionError::Transport(_)));
    assert!(err.is_user_facing());
    assert_eq!(session.phase(), Phase::Empty);
    assert!(!session.is_busy());
    assert!(session.report().is_none());
    assert!(session.file().is_none());
    assert!(session.insight_log().is_empty());
}

#[test]
fn test_failed_reupload_keeps_previous_report() {
    let mut session = ready_session(0.8);
    let before = session.snapshot();

    let service = ScriptedService::with(vec![Err(ServiceError::Timeout { secs: 1 })]);
    let other = SourceFile::new("other.csv", b"x\n".to_vec());
    assert!(session.upload_file(&service, other).is_err());

    assert_eq!(session.phase(), Phase::Ready);
    assert_eq!(session.file().map(|f| f.name()), Some("titanic.csv"));
    assert_eq!(session.report(), before.report.as_ref());
    assert_eq!(session.insight_log(), &before.insight_log);
}

#[test]
fn test_reupload_resets_log_to_single_baseline() {
    let mut session = ready_session(0.8);
    let service = ScriptedService::with(vec![
        Ok(report(0.85, COLUMNS, "survived")),
        Ok(report(0.7, &["x", "y"], "y")),
    ]);
    session.request_recalibration(&service).unwrap();
    assert_eq!(session.insight_log().len(), 2);

    session
        .upload_file(&service, SourceFile::new("xy.csv", b"x,y\n".to_vec()))
        .unwrap();
    assert_eq!(session.insight_log().len(), 1);
    assert_eq!(session.insight_log().latest().unwrap().trend, Trend::Init);
    assert_eq!(session.selected_columns(), &["x"]);
    assert_eq!(session.selected_target(), Some("y"));
}

#[test]
fn test_upload_target_is_always_a_diagnosed_column() {
    let service = ScriptedService::with(vec![
        Ok(report(0.8, &["a", "b"], "ghost")),
        Ok(report(0.8, &[], "ghost")),
    ]);
    let mut session = Session::new();

    session.upload_file(&service, file()).unwrap();
    assert_eq!(session.selected_target(), Some("b"));
    assert_eq!(session.selected_columns(), &["a"]);

    // Nothing diagnosed, so nothing can be the target
    session.upload_file(&service, file()).unwrap();
    assert_eq!(session.selected_target(), None);
    assert!(session.selected_columns().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Local mutations
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_toggle_column_twice_restores_membership() {
    let mut session = ready_session(0.8);
    let original = session.is_selected("fare");

    session.toggle_column("fare");
    assert_ne!(session.is_selected("fare"), original);
    session.toggle_column("fare");
    assert_eq!(session.is_selected("fare"), original);
}

#[test]
fn test_toggle_target_column_is_ignored() {
    let mut session = ready_session(0.8);
    let before = session.selected_columns().to_vec();
    session.toggle_column("survived");
    assert_eq!(session.selected_columns(), before.as_slice());
    assert_target_not_selected(&session);
}

#[test]
fn test_toggle_does_not_touch_report_or_log() {
    let mut session = ready_session(0.8);
    let before = session.snapshot();
    session.toggle_column("age");
    assert_eq!(session.report(), before.report.as_ref());
    assert_eq!(session.insight_log(), &before.insight_log);
}

#[test]
fn test_change_target_removes_it_from_features() {
    let mut session = ready_session(0.8);
    assert!(session.is_selected("age"));
    session.toggle_panel(Panel::TargetPicker);

    assert!(session.change_target("age"));
    assert_eq!(session.selected_target(), Some("age"));
    assert!(!session.is_selected("age"));
    assert_target_not_selected(&session);
    assert_eq!(session.active_panel(), None);
}

#[test]
fn test_change_target_without_report_is_noop() {
    let mut session = Session::new();
    assert!(!session.change_target("age"));
    assert_eq!(session.selected_target(), None);
}

#[test]
fn test_change_target_to_unknown_column_is_noop() {
    let mut session = ready_session(0.8);
    session.toggle_panel(Panel::Importance);
    assert!(!session.change_target("cabin"));
    assert_eq!(session.selected_target(), Some("survived"));
    assert_eq!(session.active_panel(), Some(Panel::Importance));
}

#[test]
fn test_only_one_panel_open() {
    let mut session = Session::new();
    session.toggle_panel(Panel::TargetPicker);
    assert_eq!(session.active_panel(), Some(Panel::TargetPicker));

    session.toggle_panel(Panel::FeaturePicker);
    assert_eq!(session.active_panel(), Some(Panel::FeaturePicker));

    session.toggle_panel(Panel::FeaturePicker);
    assert_eq!(session.active_panel(), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Recalibration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_recalibration_improvement() {
    let mut session = ready_session(0.82);
    session.toggle_column("class");

    let service = ScriptedService::with(vec![Ok(report(0.845, COLUMNS, "survived"))]);
    let entry = session.request_recalibration(&service).unwrap().clone();

    assert_eq!(entry.trend, Trend::Optimized);
    assert_eq!(entry.diff_label, "+2.5%");
    // 5 columns in the report, 3 features sent
    assert!(entry.message.contains("Pruning 2 "));

    assert_eq!(session.insight_log().len(), 2);
    assert_eq!(session.insight_log().latest(), Some(&entry));
    assert_eq!(session.insight_log().iter().nth(1).unwrap().trend, Trend::Init);
    assert!((session.report().unwrap().stats.accuracy_pct - 84.5).abs() < 1e-9);
    assert_eq!(session.phase(), Phase::Ready);

    let request = service.last_request();
    assert_eq!(request.selected_columns, vec!["age", "fare", "sex"]);
    assert_eq!(request.target_column.as_deref(), Some("survived"));
}

#[test]
fn test_recalibration_uses_current_target() {
    let mut session = ready_session(0.8);
    session.change_target("age");

    let service = ScriptedService::with(vec![Ok(report(0.8, COLUMNS, "age"))]);
    let entry = session.request_recalibration(&service).unwrap();
    assert_eq!(entry.trend, Trend::Stable);
    assert_eq!(entry.diff_label, "0.0%");

    let request = service.last_request();
    assert_eq!(request.target_column.as_deref(), Some("age"));
    assert!(!request.selected_columns.contains(&"age".to_string()));
}

#[test]
fn test_recalibration_while_busy_is_dropped() {
    let mut session = ready_session(0.8);
    let _request = session.begin_recalibration().unwrap();
    assert!(session.is_busy());
    let before = session.snapshot();

    let service = ScriptedService::with(vec![Ok(report(0.9, COLUMNS, "survived"))]);
    let err = session.request_recalibration(&service).unwrap_err();

    assert!(matches!(err, SessionError::Busy));
    assert_eq!(service.calls(), 0);
    assert_eq!(session.phase(), Phase::Recalibrating);
    assert_eq!(session.selected_columns(), before.selected_columns.as_slice());
    assert_eq!(session.insight_log(), &before.insight_log);

    // The original request still completes normally
    session
        .complete_recalibration(Ok(report(0.7, COLUMNS, "survived")))
        .unwrap();
    assert_eq!(session.insight_log().latest().unwrap().trend, Trend::Degraded);
}

#[test]
fn test_upload_while_busy_is_dropped() {
    let mut session = ready_session(0.8);
    session.begin_recalibration().unwrap();
    assert!(matches!(
        session.begin_upload(file()),
        Err(SessionError::Busy)
    ));
    assert_eq!(session.phase(), Phase::Recalibrating);
}

#[test]
fn test_recalibration_without_file_is_validation_failure() {
    let mut session = Session::new();
    let service = ScriptedService::default();
    let err = session.request_recalibration(&service).unwrap_err();

    assert!(matches!(err, SessionError::Validation(Validation::NoFile)));
    assert!(!session.is_busy());
    assert_eq!(session.phase(), Phase::Empty);
    assert_eq!(service.calls(), 0);
}

#[test]
fn test_recalibration_without_target_is_validation_failure() {
    // Report without a usable target leaves the target unset
    let service = ScriptedService::with(vec![Ok(report(0.8, &[], ""))]);
    let mut session = Session::new();
    session.upload_file(&service, file()).unwrap();
    assert_eq!(session.selected_target(), None);

    let err = session.request_recalibration(&service).unwrap_err();
    assert!(matches!(err, SessionError::Validation(Validation::NoTarget)));
    assert!(!session.is_busy());
    assert_eq!(service.calls(), 1);
}

#[test]
fn test_failed_recalibration_leaves_state_intact() {
    let mut session = ready_session(0.8);
    session.toggle_column("age");
    let before = session.snapshot();

    let service = ScriptedService::with(vec![Err(ServiceError::Network("reset".into()))]);
    let err = session.request_recalibration(&service).unwrap_err();

    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(session.phase(), Phase::Ready);
    assert!(!session.is_busy());
    assert_eq!(session.report(), before.report.as_ref());
    assert_eq!(session.insight_log(), &before.insight_log);
    assert_eq!(session.selected_columns(), before.selected_columns.as_slice());
}

#[test]
fn test_log_keeps_five_newest() {
    let mut session = ready_session(0.50);
    let accuracies = [0.51, 0.52, 0.53, 0.54, 0.55, 0.56];
    let service = ScriptedService::with(
        accuracies
            .iter()
            .map(|a| Ok(report(*a, COLUMNS, "survived")))
            .collect(),
    );

    let mut previous_front = None;
    for _ in accuracies {
        let id = session.request_recalibration(&service).unwrap().id;
        assert_eq!(session.insight_log().latest().map(|e| e.id), Some(id));
        if let Some(prev) = previous_front {
            assert_eq!(session.insight_log().iter().nth(1).map(|e| e.id), Some(prev));
        }
        previous_front = Some(id);
        assert!(session.insight_log().len() <= INSIGHT_LOG_CAPACITY);
    }

    assert_eq!(session.insight_log().len(), INSIGHT_LOG_CAPACITY);
    // Baseline was evicted long ago
    assert!(session.insight_log().iter().all(|e| e.trend != Trend::Init));
}

#[test]
fn test_completion_without_request_is_rejected() {
    let mut session = ready_session(0.8);
    let before = session.snapshot();
    assert!(matches!(
        session.complete_recalibration(Ok(report(0.9, COLUMNS, "survived"))),
        Err(SessionError::NothingInFlight)
    ));
    assert!(matches!(
        session.complete_upload(Ok(report(0.9, COLUMNS, "survived"))),
        Err(SessionError::NothingInFlight)
    ));
    assert_eq!(session.insight_log(), &before.insight_log);
}

#[test]
fn test_mismatched_completion_keeps_request_in_flight() {
    let mut session = ready_session(0.8);
    session.begin_recalibration().unwrap();
    assert!(matches!(
        session.complete_upload(Ok(report(0.9, COLUMNS, "survived"))),
        Err(SessionError::NothingInFlight)
    ));
    assert!(session.is_busy());
    assert!(session
        .complete_recalibration(Ok(report(0.9, COLUMNS, "survived")))
        .is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Download gate
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_download_requires_report_and_idle() {
    let mut session = Session::new();
    assert!(matches!(
        session.ensure_downloadable(),
        Err(SessionError::Validation(Validation::NoReport))
    ));

    let service = ScriptedService::with(vec![Ok(report(0.8, COLUMNS, "survived"))]);
    session.upload_file(&service, file()).unwrap();
    assert!(session.ensure_downloadable().is_ok());
    assert_eq!(session.download_file_name(), "cleaned_titanic.csv");

    session.begin_recalibration().unwrap();
    assert!(matches!(
        session.ensure_downloadable(),
        Err(SessionError::Busy)
    ));
}

#[test]
fn test_snapshot_serializes() {
    let session = ready_session(0.8);
    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["phase"], "Ready");
    assert_eq!(json["selected_target"], "survived");
    assert_eq!(json["insight_log"][0]["trend"], "INIT");
}
