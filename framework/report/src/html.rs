use crate::error::ReportWriteError;
use load_suite_model::{AggregateSummary, RunResult, RunStatus};
use minijinja::{context, Environment};
use serde::Serialize;

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("../templates/report.html");

const TITLE: &str = "Load Test Report";

#[derive(Serialize)]
struct SummaryView {
    total: usize,
    passed: usize,
    failed: usize,
    success_rate: String,
    total_duration: String,
    total_requests: u64,
    total_iterations: u64,
    avg_response_time: String,
}

impl From<AggregateSummary> for SummaryView {
    fn from(summary: AggregateSummary) -> Self {
        Self {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            success_rate: format!("{:.1}", summary.success_rate_pct),
            total_duration: format!("{:.2}", summary.total_duration_seconds),
            total_requests: summary.total_requests,
            total_iterations: summary.total_iterations,
            avg_response_time: format!("{:.2}", summary.avg_response_time_ms),
        }
    }
}

#[derive(Serialize)]
struct MetricsView {
    requests: u64,
    iterations: u64,
    avg: String,
    med: String,
    p95: String,
    max: String,
    check_rate: String,
    fail_rate: String,
    data_sent: String,
    data_received: String,
    max_vus: u64,
}

#[derive(Serialize)]
struct ResultView<'a> {
    name: &'a str,
    description: &'a str,
    script_ref: &'a str,
    status: String,
    badge_class: &'static str,
    duration: String,
    timestamp: String,
    metrics: Option<MetricsView>,
    error: Option<&'a str>,
}

impl<'a> From<&'a RunResult> for ResultView<'a> {
    fn from(result: &'a RunResult) -> Self {
        // The metric grid only belongs to scenarios that ran to completion
        let metrics = result
            .metrics
            .as_ref()
            .filter(|_| result.is_passed())
            .map(|m| MetricsView {
                requests: m.http_requests,
                iterations: m.iterations,
                avg: format!("{:.2}", m.request_duration.avg),
                med: format!("{:.2}", m.request_duration.med),
                p95: format!("{:.2}", m.request_duration.p95),
                max: format!("{:.2}", m.request_duration.max),
                check_rate: m.checks.rate.to_string(),
                fail_rate: m.request_failure_rate.to_string(),
                data_sent: or_dash(&m.data_sent),
                data_received: or_dash(&m.data_received),
                max_vus: m.max_virtual_users,
            });

        Self {
            name: &result.scenario.name,
            description: &result.scenario.description,
            script_ref: &result.scenario.script_ref,
            status: result.status.to_string(),
            badge_class: match result.status {
                RunStatus::Passed => "passed",
                RunStatus::Failed => "failed",
            },
            duration: format!("{:.2}", result.duration_seconds),
            timestamp: crate::timestamp(result),
            metrics,
            error: result.error.as_deref(),
        }
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Render the HTML report for a list of results.
///
/// The output depends only on the results and the generation label, rendering the same input twice
/// gives the same document.
pub fn render_html(results: &[RunResult], generated: &str) -> Result<String, ReportWriteError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;
    let template = env.get_template(TEMPLATE_NAME)?;

    let summary = SummaryView::from(AggregateSummary::from_results(results));
    let results = results.iter().map(ResultView::from).collect::<Vec<_>>();

    let html = template.render(context! {
        title => TITLE,
        generated => generated,
        summary => summary,
        results => results,
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use load_suite_model::{MetricsSnapshot, ScenarioDescriptor};

    const LABEL: &str = "2024-03-01T12:00:00.000Z";

    fn results() -> Vec<RunResult> {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut metrics = MetricsSnapshot {
            http_requests: 50,
            data_received: "1.5 KB".to_string(),
            ..Default::default()
        };
        metrics.request_duration.avg = 120.0;

        vec![
            RunResult::passed(
                ScenarioDescriptor::new("Health Check", "health.js", "Probes the health endpoint"),
                12.5,
                started,
                metrics,
            ),
            RunResult::failed(
                ScenarioDescriptor::new("Authentication", "auth.js", "Logs in <and> out"),
                0.25,
                started,
                "connection refused",
            ),
        ]
    }

    #[test]
    fn rendering_is_idempotent() {
        let results = results();
        let first = render_html(&results, LABEL).unwrap();
        let second = render_html(&results, LABEL).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_result_has_one_badge_and_its_error() {
        let html = render_html(&results(), LABEL).unwrap();

        assert_eq!(1, html.matches(r#"<span class="badge failed">FAILED</span>"#).count());
        assert_eq!(1, html.matches(r#"<span class="badge passed">PASSED</span>"#).count());

        let failed_block = html
            .split(r#"<article class="scenario">"#)
            .find(|block| block.contains("FAILED</span>"))
            .unwrap();
        assert!(failed_block.contains(r#"<div class="error">connection refused</div>"#));
        assert!(!failed_block.contains(r#"<div class="metrics">"#));
    }

    #[test]
    fn passed_result_has_metric_grid() {
        let html = render_html(&results(), LABEL).unwrap();
        let passed_block = html
            .split(r#"<article class="scenario">"#)
            .find(|block| block.contains("PASSED</span>"))
            .unwrap();

        assert!(passed_block.contains(r#"<div class="value">50</div>"#));
        assert!(passed_block.contains("120.00 ms"));
        assert!(passed_block.contains("1.5 KB"));
        assert!(!passed_block.contains(r#"class="error""#));
    }

    #[test]
    fn shows_summary_and_label() {
        let html = render_html(&results(), LABEL).unwrap();
        assert!(html.contains("Generated 2024-03-01T12:00:00.000Z"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("12.75 s"));
    }

    #[test]
    fn escapes_scenario_text() {
        let html = render_html(&results(), LABEL).unwrap();
        assert!(html.contains("Logs in &lt;and&gt; out"));
    }

    #[test]
    fn renders_without_results() {
        let html = render_html(&[], LABEL).unwrap();
        assert!(html.contains(r#"<div class="value">0</div><div class="label">Scenarios</div>"#));
        assert!(!html.contains(r#"<article class="scenario">"#));
    }
}
