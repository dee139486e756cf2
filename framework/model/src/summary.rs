use crate::{round_to, RunResult, RunStatus};
use serde::{Deserialize, Serialize};

/// Totals over a list of run results.
///
/// This is a view, it holds no state of its own and is recomputed from the results every time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passed scenarios, to one decimal place. Zero for an empty list.
    pub success_rate_pct: f64,
    pub total_duration_seconds: f64,
    /// Summed over results that have metrics
    pub total_requests: u64,
    /// Summed over results that have metrics
    pub total_iterations: u64,
    /// Mean of the average request duration of the results that have metrics
    pub avg_response_time_ms: f64,
}

impl AggregateSummary {
    pub fn from_results(results: &[RunResult]) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.status == RunStatus::Passed)
            .count();
        let failed = total - passed;

        let success_rate_pct = if total == 0 {
            0.0
        } else if failed > 0 {
            // rounding must not report a full success rate while there are failures
            round_to(passed as f64 / total as f64 * 100.0, 1).min(99.9)
        } else {
            100.0
        };

        let with_metrics = results
            .iter()
            .filter_map(|r| r.metrics.as_ref())
            .collect::<Vec<_>>();

        let avg_response_time_ms = if with_metrics.is_empty() {
            0.0
        } else {
            with_metrics
                .iter()
                .map(|m| m.request_duration.avg)
                .sum::<f64>()
                / with_metrics.len() as f64
        };

        Self {
            total,
            passed,
            failed,
            success_rate_pct,
            total_duration_seconds: results.iter().map(|r| r.duration_seconds).sum(),
            total_requests: with_metrics.iter().map(|m| m.http_requests).sum(),
            total_iterations: with_metrics.iter().map(|m| m.iterations).sum(),
            avg_response_time_ms,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DurationStats, MetricsSnapshot, ScenarioDescriptor};
    use chrono::Utc;

    fn passed(requests: u64, iterations: u64, avg: f64, duration: f64) -> RunResult {
        RunResult::passed(
            ScenarioDescriptor::new("p", "p.js", "p"),
            duration,
            Utc::now(),
            MetricsSnapshot {
                http_requests: requests,
                iterations,
                request_duration: DurationStats {
                    avg,
                    ..Default::default()
                },
                ..Default::default()
            },
        )
    }

    fn failed(duration: f64) -> RunResult {
        RunResult::failed(
            ScenarioDescriptor::new("f", "f.js", "f"),
            duration,
            Utc::now(),
            "exit status 1",
        )
    }

    #[test]
    fn empty_list() {
        let summary = AggregateSummary::from_results(&[]);
        assert_eq!(0, summary.total);
        assert_eq!(0.0, summary.success_rate_pct);
        assert_eq!(0.0, summary.avg_response_time_ms);
    }

    #[test]
    fn one_passed_one_failed() {
        let results = vec![passed(50, 10, 120.0, 2.0), failed(0.5)];
        let summary = AggregateSummary::from_results(&results);

        assert_eq!(2, summary.total);
        assert_eq!(1, summary.passed);
        assert_eq!(1, summary.failed);
        assert_eq!(50.0, summary.success_rate_pct);
        assert_eq!(2.5, summary.total_duration_seconds);
        assert_eq!(50, summary.total_requests);
        assert_eq!(10, summary.total_iterations);
        // failed results do not dilute the mean
        assert_eq!(120.0, summary.avg_response_time_ms);
    }

    #[test]
    fn success_rate_rounds_to_one_place() {
        let results = vec![passed(1, 1, 1.0, 1.0), failed(1.0), failed(1.0)];
        let summary = AggregateSummary::from_results(&results);
        assert_eq!(33.3, summary.success_rate_pct);

        let results = vec![passed(1, 1, 1.0, 1.0), passed(1, 1, 1.0, 1.0), failed(1.0)];
        let summary = AggregateSummary::from_results(&results);
        assert_eq!(66.7, summary.success_rate_pct);
    }

    #[test]
    fn full_success_rate_only_when_all_passed() {
        let all = vec![passed(1, 1, 10.0, 1.0), passed(2, 2, 30.0, 1.0)];
        let summary = AggregateSummary::from_results(&all);
        assert_eq!(100.0, summary.success_rate_pct);
        assert!(summary.all_passed());
        assert_eq!(20.0, summary.avg_response_time_ms);

        let mut many = (0..199).map(|_| passed(1, 1, 1.0, 1.0)).collect::<Vec<_>>();
        many.push(failed(1.0));
        let summary = AggregateSummary::from_results(&many);
        assert_eq!(99.5, summary.success_rate_pct);
        assert!(!summary.all_passed());

        let mut nearly_all = (0..1999).map(|_| passed(1, 1, 1.0, 1.0)).collect::<Vec<_>>();
        nearly_all.push(failed(1.0));
        let summary = AggregateSummary::from_results(&nearly_all);
        assert_eq!(99.9, summary.success_rate_pct);
    }

    #[test]
    fn recomputing_gives_the_same_summary() {
        let results = vec![passed(5, 1, 7.5, 1.0), failed(2.0)];
        assert_eq!(
            AggregateSummary::from_results(&results),
            AggregateSummary::from_results(&results)
        );
    }
}
