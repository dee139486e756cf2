use chrono::{TimeZone, Utc};
use load_suite_model::{MetricsSnapshot, RunResult, ScenarioDescriptor};
use load_suite_report::{render_csv, render_html, ReportWriteError, ReportWriter};
use pretty_assertions::assert_eq;

const LABEL: &str = "2024-03-01T12:00:00.000Z";

fn results() -> Vec<RunResult> {
    let started = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut metrics = MetricsSnapshot {
        http_requests: 50,
        ..Default::default()
    };
    metrics.request_duration.avg = 120.0;

    vec![
        RunResult::passed(
            ScenarioDescriptor::new("Health Check", "health.js", "Probes the health endpoint"),
            10.0,
            started,
            metrics,
        ),
        RunResult::failed(
            ScenarioDescriptor::new("Authentication", "auth.js", "Logs in"),
            1.0,
            started,
            "connection refused",
        ),
    ]
}

#[test]
fn writes_both_reports_named_by_label() {
    let dir = tempfile::tempdir().unwrap();
    let report_dir = dir.path().join("reports");
    let results = results();

    let artifacts = ReportWriter::new(&report_dir).write(&results, LABEL).unwrap();

    assert_eq!(
        report_dir.join("load-test-report-2024-03-01T12-00-00-000Z.html"),
        artifacts.html.path
    );
    assert_eq!(
        report_dir.join("load-test-results-2024-03-01T12-00-00-000Z.csv"),
        artifacts.csv.path
    );
    assert_eq!(
        render_html(&results, LABEL).unwrap(),
        std::fs::read_to_string(&artifacts.html.path).unwrap()
    );

    let csv = std::fs::read_to_string(&artifacts.csv.path).unwrap();
    assert_eq!(render_csv(&results), csv);
    assert_eq!(2, csv.lines().skip(1).count());
}

#[test]
fn unusable_report_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "").unwrap();

    let err = ReportWriter::new(blocked.join("reports"))
        .write(&results(), LABEL)
        .unwrap_err();

    assert!(matches!(err, ReportWriteError::CreateDir { .. }));
}
