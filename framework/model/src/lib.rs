//! The canonical model for load suite runs.
//!
//! Every crate in the workspace speaks in these types: scenarios are described by a
//! [ScenarioDescriptor], each execution produces exactly one [RunResult] and the metrics of a
//! successful run are normalised into a [MetricsSnapshot], whichever evidence they came from.

mod bytes;
mod journal;
mod summary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use bytes::format_bytes;
pub use journal::{append_run_result, load_run_results, store_run_result, JournalError};
pub use summary::AggregateSummary;

/// A load test scenario, as passed to the load generation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDescriptor {
    /// Human readable name of the scenario
    pub name: String,
    /// Reference to the script the engine runs.
    ///
    /// This identifies the scenario, two descriptors with the same script are the same scenario.
    pub script_ref: String,
    /// What the scenario exercises
    pub description: String,
}

impl ScenarioDescriptor {
    pub fn new(
        name: impl Into<String>,
        script_ref: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            script_ref: script_ref.into(),
            description: description.into(),
        }
    }

    /// A file name friendly version of the scenario name.
    ///
    /// Runs of characters that are not ASCII alphanumeric collapse into a single `-`.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        if slug.is_empty() {
            slug.push_str("scenario");
        }
        slug
    }
}

/// Outcome of executing one scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[display("PASSED")]
    Passed,
    #[display("FAILED")]
    Failed,
}

/// A percentage, kept to two decimal places.
///
/// Displays with exactly two decimals, so a check rate of `0.95` reads as `95.00`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Percentage {
    /// From a ratio in `[0, 1]`.
    pub fn from_ratio(ratio: f64) -> Self {
        Self(round_to(ratio * 100.0, 2))
    }

    /// From a value that is already a percentage.
    pub fn from_percent(percent: f64) -> Self {
        Self(round_to(percent, 2))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Request duration statistics, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DurationStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub med: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckStats {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    /// Share of checks that passed
    pub rate: Percentage,
}

/// The canonical metrics of a single scenario run.
///
/// Every field has a zero or empty default. A field that could not be derived from the run
/// evidence keeps its default, missing evidence is never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub http_requests: u64,
    pub request_duration: DurationStats,
    pub request_failure_rate: Percentage,
    pub iterations: u64,
    pub checks: CheckStats,
    pub max_virtual_users: u64,
    /// Human readable size, see [format_bytes]
    pub data_received: String,
    /// Human readable size, see [format_bytes]
    pub data_sent: String,
}

/// The result of executing one scenario.
///
/// Created once per scenario, in execution order, and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub scenario: ScenarioDescriptor,
    pub status: RunStatus,
    /// Wall clock time spent in the engine, in seconds
    pub duration_seconds: f64,
    /// When the scenario started
    pub timestamp: DateTime<Utc>,
    /// Only present for scenarios that ran to completion
    pub metrics: Option<MetricsSnapshot>,
    /// Only present for scenarios that failed
    pub error: Option<String>,
}

impl RunResult {
    /// A scenario that ran to completion.
    pub fn passed(
        scenario: ScenarioDescriptor,
        duration_seconds: f64,
        timestamp: DateTime<Utc>,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            scenario,
            status: RunStatus::Passed,
            duration_seconds,
            timestamp,
            metrics: Some(metrics),
            error: None,
        }
    }

    /// A scenario that could not be executed, or whose engine reported a failure.
    pub fn failed(
        scenario: ScenarioDescriptor,
        duration_seconds: f64,
        timestamp: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            scenario,
            status: RunStatus::Failed,
            duration_seconds,
            timestamp,
            metrics: None,
            error: Some(error.into()),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == RunStatus::Passed
    }
}

/// Make a timestamp label usable in a file name.
///
/// Every character that is not ASCII alphanumeric or `-` becomes `-`, so
/// `2024-03-01T12:00:00.000Z` turns into `2024-03-01T12-00-00-000Z`.
pub fn file_safe_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Round `value` to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_separators() {
        let scenario = ScenarioDescriptor::new("Create Resource (POST)", "create.js", "");
        assert_eq!("create-resource-post", scenario.slug());
    }

    #[test]
    fn slug_of_symbols_only_falls_back() {
        let scenario = ScenarioDescriptor::new("!!!", "bang.js", "");
        assert_eq!("scenario", scenario.slug());
    }

    #[test]
    fn file_safe_label_replaces_separators() {
        assert_eq!(
            "2024-03-01T12-00-00-000Z",
            file_safe_label("2024-03-01T12:00:00.000Z")
        );
        assert_eq!("2024-03-01T12-00-00-00-00", file_safe_label("2024-03-01T12:00:00+00:00"));
    }

    #[test]
    fn percentage_displays_two_decimals() {
        assert_eq!("95.00", Percentage::from_ratio(0.95).to_string());
        assert_eq!("12.35", Percentage::from_percent(12.345).to_string());
        assert_eq!("0.00", Percentage::default().to_string());
    }

    #[test]
    fn status_displays_upper_case() {
        assert_eq!("PASSED", RunStatus::Passed.to_string());
        assert_eq!("FAILED", RunStatus::Failed.to_string());
    }

    #[test]
    fn failed_result_has_no_metrics() {
        let result = RunResult::failed(
            ScenarioDescriptor::new("a", "a.js", "a"),
            0.5,
            Utc::now(),
            "connection refused",
        );
        assert!(!result.is_passed());
        assert!(result.metrics.is_none());
        assert_eq!(Some("connection refused"), result.error.as_deref());
    }

    #[test]
    fn run_result_serializes_status_upper_case() {
        let result = RunResult::passed(
            ScenarioDescriptor::new("a", "a.js", "a"),
            1.0,
            Utc::now(),
            MetricsSnapshot::default(),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!("PASSED", json["status"]);
        assert_eq!("a.js", json["scenario"]["scriptRef"]);
    }
}
