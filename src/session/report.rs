//! Analysis report value type and wire decoding
//!
//! A `Report` is what one analysis or recalibration call returns. It is never
//! mutated after construction: the session swaps the whole value on every
//! successful request.
//!
//! The service is loose about what it sends (older builds omit
//! `missing_after`, `target_used` and `column_diagnostics`), so the wire layer
//! is all-optional and `Report::from_wire` fills the gaps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Cardinality ratio above which a column looks like a row identifier
const POTENTIAL_ID_RATIO: f64 = 0.9;

/// Accuracy (percent) above which the score is too good to be true
const LEAKAGE_THRESHOLD_PCT: f64 = 99.0;

// ─────────────────────────────────────────────────────────────────────────────
// Domain types
// ─────────────────────────────────────────────────────────────────────────────

/// One preview row: column identifier -> scalar value
pub type PreviewRow = BTreeMap<String, Value>;

/// Headline statistics for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStats {
    /// Model accuracy on the percentage scale (0-100). `NaN` when the service
    /// sent nothing usable.
    pub accuracy_pct: f64,
    pub rows: u64,
    pub missing_before: u64,
    pub missing_after: u64,
    /// Column the model was trained to predict
    pub target_used: String,
}

/// Per-column diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDiagnostic {
    pub identifier: String,
    pub label: String,
    pub kind: String,
    pub cardinality: u64,
    pub missing_pct: f64,
}

impl ColumnDiagnostic {
    /// Unique values cover almost every row, so the column is probably an ID
    /// and carries no predictive signal.
    pub fn is_potential_id(&self, rows: u64) -> bool {
        rows > 0 && self.cardinality as f64 > rows as f64 * POTENTIAL_ID_RATIO
    }
}

/// Immutable result of one analysis/recalibration call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub stats: ReportStats,
    pub column_diagnostics: Vec<ColumnDiagnostic>,
    pub feature_importance: BTreeMap<String, f64>,
    pub health_data: BTreeMap<String, u64>,
    pub preview_rows: Vec<PreviewRow>,
}

impl Report {
    /// Decode a raw JSON response body
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let wire: WireReport = serde_json::from_slice(body)?;
        Ok(Self::from_wire(wire))
    }

    /// Convert the lenient wire shape into a well-formed report
    pub fn from_wire(wire: WireReport) -> Self {
        let WireReport {
            stats,
            analysis,
            preview_data,
        } = wire;

        // Identifiers must be unique; keep the first occurrence
        let mut seen = HashSet::new();
        let column_diagnostics: Vec<ColumnDiagnostic> = analysis
            .column_diagnostics
            .into_iter()
            .filter(|d| seen.insert(d.value.clone()))
            .map(|d| ColumnDiagnostic {
                label: d.label.unwrap_or_else(|| d.value.clone()),
                identifier: d.value,
                kind: d.kind.unwrap_or_else(|| "unknown".to_string()),
                cardinality: d.cardinality,
                missing_pct: d.missing_pct.clamp(0.0, 100.0),
            })
            .collect();

        // The service defaults to the last column of the frame as its target.
        // A named target must be one of the diagnosed columns when there are any.
        let target_used = stats
            .target_used
            .filter(|t| {
                !t.is_empty()
                    && (column_diagnostics.is_empty()
                        || column_diagnostics.iter().any(|d| &d.identifier == t))
            })
            .or_else(|| column_diagnostics.last().map(|d| d.identifier.clone()))
            .unwrap_or_default();

        let feature_importance = analysis
            .feature_importance
            .into_iter()
            .map(|(k, v)| (k, if v.is_finite() { v.max(0.0) } else { 0.0 }))
            .collect();

        Self {
            stats: ReportStats {
                accuracy_pct: stats.accuracy.map_or(f64::NAN, |a| a.as_percent()),
                rows: stats.rows,
                missing_before: stats.missing_before,
                missing_after: stats.missing_after,
                target_used,
            },
            column_diagnostics,
            feature_importance,
            health_data: analysis.health_data,
            preview_rows: preview_data,
        }
    }

    /// Whether `identifier` names a column of this report
    pub fn has_column(&self, identifier: &str) -> bool {
        self.column_diagnostics
            .iter()
            .any(|d| d.identifier == identifier)
    }

    /// All column identifiers in diagnostics order
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.column_diagnostics.iter().map(|d| d.identifier.as_str())
    }

    /// Feature importance, heaviest first (ties broken by name)
    pub fn ranked_importance(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .feature_importance
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Total anomalies healed across all columns
    pub fn total_healed(&self) -> u64 {
        self.health_data.values().sum()
    }

    /// A near-perfect score usually means the target leaked into the features
    pub fn leakage_suspected(&self) -> bool {
        self.stats.accuracy_pct.is_finite() && self.stats.accuracy_pct > LEAKAGE_THRESHOLD_PCT
    }

    /// Accuracy formatted for display, `--` when unknown
    pub fn accuracy_label(&self) -> String {
        if self.stats.accuracy_pct.is_finite() {
            format!("{:.1}%", self.stats.accuracy_pct)
        } else {
            "--".to_string()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

/// Response body as sent by the analysis service
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireReport {
    pub stats: WireStats,
    pub analysis: WireAnalysis,
    pub preview_data: Vec<PreviewRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireStats {
    pub accuracy: Option<WireAccuracy>,
    pub rows: u64,
    pub missing_before: u64,
    pub missing_after: u64,
    pub target_used: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireAnalysis {
    pub column_diagnostics: Vec<WireColumn>,
    pub feature_importance: BTreeMap<String, f64>,
    pub health_data: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub struct WireColumn {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub cardinality: u64,
    #[serde(default)]
    pub missing_pct: f64,
}

/// Accuracy arrives either as a number or as a formatted string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireAccuracy {
    Number(f64),
    Text(String),
}

impl WireAccuracy {
    /// Normalise to the percentage scale.
    ///
    /// Numbers up to 1.0 are fractions; larger numbers are already percent.
    /// Strings are always percent, with or without a trailing `%`.
    pub fn as_percent(&self) -> f64 {
        match self {
            WireAccuracy::Number(n) if *n <= 1.0 => n * 100.0,
            WireAccuracy::Number(n) => *n,
            WireAccuracy::Text(s) => s
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .unwrap_or(f64::NAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Report {
        Report::from_json(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_full_response_decodes() {
        let report = decode(json!({
            "stats": {
                "accuracy": 0.825,
                "rows": 891,
                "missing_before": 866,
                "missing_after": 0,
                "target_used": "Survived"
            },
            "analysis": {
                "column_diagnostics": [
                    {"value": "Age", "label": "Age", "type": "numeric", "cardinality": 88, "missing_pct": 19.87},
                    {"value": "PassengerId", "label": "Passenger Id", "type": "numeric", "cardinality": 891, "missing_pct": 0.0},
                    {"value": "Survived", "label": "Survived", "type": "numeric", "cardinality": 2, "missing_pct": 0.0}
                ],
                "feature_importance": {"Age": 0.4, "PassengerId": 0.1},
                "health_data": {"Age": 177, "Cabin": 687}
            },
            "preview_data": [{"Age": 22.0, "Survived": 0}]
        }));

        assert!((report.stats.accuracy_pct - 82.5).abs() < 1e-9);
        assert_eq!(report.stats.rows, 891);
        assert_eq!(report.stats.target_used, "Survived");
        assert_eq!(report.column_diagnostics.len(), 3);
        assert_eq!(report.column_diagnostics[1].label, "Passenger Id");
        assert_eq!(report.total_healed(), 864);
        assert_eq!(report.preview_rows.len(), 1);
        assert!(report.has_column("Age"));
        assert!(!report.has_column("Cabin"));
    }

    #[test]
    fn test_accuracy_formats() {
        assert!((WireAccuracy::Number(0.9).as_percent() - 90.0).abs() < 1e-9);
        assert!((WireAccuracy::Number(1.0).as_percent() - 100.0).abs() < 1e-9);
        assert!((WireAccuracy::Number(84.5).as_percent() - 84.5).abs() < 1e-9);
        assert!((WireAccuracy::Text("84.5%".into()).as_percent() - 84.5).abs() < 1e-9);
        assert!((WireAccuracy::Text(" 70.1 ".into()).as_percent() - 70.1).abs() < 1e-9);
        assert!(WireAccuracy::Text("n/a".into()).as_percent().is_nan());
    }

    #[test]
    fn test_sparse_response_uses_defaults() {
        // Shape produced by older service builds
        let report = decode(json!({
            "stats": {"accuracy": "91.2%", "missing_before": 12, "rows": 100},
            "analysis": {"health_data": {"a": 12}, "feature_importance": {}},
            "preview_data": []
        }));

        assert_eq!(report.stats.missing_after, 0);
        assert_eq!(report.stats.target_used, "");
        assert!(report.column_diagnostics.is_empty());
        assert_eq!(report.accuracy_label(), "91.2%");
    }

    #[test]
    fn test_missing_target_falls_back_to_last_column() {
        let report = decode(json!({
            "stats": {"accuracy": 0.5},
            "analysis": {"column_diagnostics": [{"value": "x"}, {"value": "y"}]}
        }));
        assert_eq!(report.stats.target_used, "y");
        assert_eq!(report.column_diagnostics[0].kind, "unknown");
    }

    #[test]
    fn test_unknown_target_falls_back_to_last_column() {
        let report = decode(json!({
            "stats": {"accuracy": 0.5, "target_used": "ghost"},
            "analysis": {"column_diagnostics": [{"value": "x"}, {"value": "y"}]}
        }));
        assert_eq!(report.stats.target_used, "y");
        assert!(report.has_column(&report.stats.target_used));
    }

    #[test]
    fn test_duplicate_identifiers_are_dropped() {
        let report = decode(json!({
            "analysis": {"column_diagnostics": [
                {"value": "x", "cardinality": 1},
                {"value": "x", "cardinality": 2}
            ]}
        }));
        assert_eq!(report.column_diagnostics.len(), 1);
        assert_eq!(report.column_diagnostics[0].cardinality, 1);
    }

    #[test]
    fn test_missing_accuracy_is_nan() {
        let report = decode(json!({}));
        assert!(report.stats.accuracy_pct.is_nan());
        assert_eq!(report.accuracy_label(), "--");
        assert!(!report.leakage_suspected());
    }

    #[test]
    fn test_ranked_importance_and_leakage() {
        let report = decode(json!({
            "stats": {"accuracy": 0.995},
            "analysis": {"feature_importance": {"a": 0.1, "b": 0.7, "c": 0.2}}
        }));
        let names: Vec<&str> = report.ranked_importance().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert!(report.leakage_suspected());
    }

    #[test]
    fn test_potential_id_flag() {
        let column = ColumnDiagnostic {
            identifier: "id".into(),
            label: "id".into(),
            kind: "numeric".into(),
            cardinality: 95,
            missing_pct: 0.0,
        };
        assert!(column.is_potential_id(100));
        assert!(!column.is_potential_id(200));
        assert!(!column.is_potential_id(0));
    }
}
