//! Recalibration insight engine
//!
//! Turns an accuracy change into a human-readable log entry. Classification
//! and message synthesis are pure: identical inputs always produce the same
//! trend, label and message. Only the entry id and timestamp vary.

use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of entries kept in the insight log
pub const INSIGHT_LOG_CAPACITY: usize = 5;

/// Label used in place of a delta for the baseline entry
pub const INIT_LABEL: &str = "INIT";

/// Classification of one recalibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Optimized,
    Degraded,
    Stable,
    Init,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Optimized => "OPTIMIZED",
            Trend::Degraded => "DEGRADED",
            Trend::Stable => "STABLE",
            Trend::Init => "INIT",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs captured around one recalibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recalibration {
    /// Accuracy before the request, percentage scale
    pub prev_accuracy: f64,
    /// Accuracy reported by the response, percentage scale
    pub new_accuracy: f64,
    /// Columns in the report the selection was made against (target included)
    pub total_columns: usize,
    /// Features that were sent as selected
    pub active_features: usize,
}

/// Deterministic part of an insight
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub trend: Trend,
    /// Rounded percentage-point delta
    pub diff: f64,
    pub diff_label: String,
    /// `total_columns - active_features`, as computed (can be negative if the
    /// selection was inconsistent)
    pub pruned: i64,
    pub message: String,
}

/// Evaluate a recalibration. Never fails; non-finite accuracies count as zero.
pub fn evaluate(recal: &Recalibration) -> Insight {
    let prev = finite_or_zero(recal.prev_accuracy);
    let new = finite_or_zero(recal.new_accuracy);
    let diff = round_one_decimal(new - prev);

    let trend = if diff > 0.0 {
        Trend::Optimized
    } else if diff < 0.0 {
        Trend::Degraded
    } else {
        Trend::Stable
    };

    let pruned = recal.total_columns as i64 - recal.active_features as i64;

    Insight {
        trend,
        diff,
        diff_label: format_diff(diff),
        pruned,
        message: synthesize_message(trend, pruned),
    }
}

fn synthesize_message(trend: Trend, pruned: i64) -> String {
    match trend {
        Trend::Optimized => format!(
            "Pruning {} low-value features sharpened focus on the primary predictors.",
            pruned
        ),
        Trend::Degraded => {
            "Removing features impaired the model's ability to capture underlying patterns."
                .to_string()
        }
        Trend::Stable => {
            "Weights recalculated. The model remains stable with the current feature set."
                .to_string()
        }
        Trend::Init => baseline_message(None),
    }
}

fn baseline_message(target: Option<&str>) -> String {
    match target {
        Some(t) if !t.is_empty() => format!(
            "Baseline established on {}. Toggle features or change the target, then recalibrate to compare.",
            t
        ),
        _ => "Baseline established. Toggle features or change the target, then recalibrate to compare."
            .to_string(),
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Round to one decimal place, folding `-0.0` into `0.0`
fn round_one_decimal(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `+2.5%`, `-1.0%`, `0.0%`
pub fn format_diff(diff: f64) -> String {
    if diff > 0.0 {
        format!("+{:.1}%", diff)
    } else {
        format!("{:.1}%", diff)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Log entries
// ─────────────────────────────────────────────────────────────────────────────

/// One line of the insight log. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightLogEntry {
    /// Display identity only; ordering comes from the log itself
    pub id: u64,
    pub trend: Trend,
    pub diff_label: String,
    pub timestamp: String,
    pub message: String,
}

impl InsightLogEntry {
    /// Build an entry from an evaluated insight, stamped with local time
    pub fn from_insight(id: u64, insight: Insight) -> Self {
        Self {
            id,
            trend: insight.trend,
            diff_label: insight.diff_label,
            timestamp: local_timestamp(),
            message: insight.message,
        }
    }

    /// Synthetic first entry written after a successful upload
    pub fn baseline(id: u64, target: Option<&str>) -> Self {
        Self {
            id,
            trend: Trend::Init,
            diff_label: INIT_LABEL.to_string(),
            timestamp: local_timestamp(),
            message: baseline_message(target),
        }
    }

    /// Single-line rendering used for clipboard export and headless output
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {:<9} {:>7}  {}",
            self.timestamp, self.trend, self.diff_label, self.message
        )
    }
}

fn local_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Newest-first log bounded to `INSIGHT_LOG_CAPACITY` entries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InsightLog {
    entries: VecDeque<InsightLogEntry>,
}

impl InsightLog {
    /// Put `entry` at index 0, evicting the oldest entry past capacity
    pub fn push_front(&mut self, entry: InsightLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(INSIGHT_LOG_CAPACITY);
    }

    /// Replace the whole log with a single entry
    pub fn reset(&mut self, entry: InsightLogEntry) {
        self.entries.clear();
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry
    pub fn latest(&self) -> Option<&InsightLogEntry> {
        self.entries.front()
    }

    /// Entries newest first
    pub fn iter(&self) -> impl Iterator<Item = &InsightLogEntry> {
        self.entries.iter()
    }
}
