use itertools::Itertools;
use load_suite_model::RunResult;

pub const CSV_HEADER: &str =
    "name,status,duration,iterations,requests,avgResponseTime,p95ResponseTime,successRate,failRate,timestamp";

/// Render one CSV row per result, under a fixed header.
///
/// String fields are quoted. Metric columns of a result without metrics are `0`.
pub fn render_csv(results: &[RunResult]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for result in results {
        let metrics = result.metrics.clone().unwrap_or_default();
        let row = [
            quote(&result.scenario.name),
            quote(&result.status.to_string()),
            format!("{:.2}", result.duration_seconds),
            metrics.iterations.to_string(),
            metrics.http_requests.to_string(),
            format!("{:.2}", metrics.request_duration.avg),
            format!("{:.2}", metrics.request_duration.p95),
            metrics.checks.rate.to_string(),
            metrics.request_failure_rate.to_string(),
            quote(&crate::timestamp(result)),
        ];
        out.push_str(&row.iter().join(","));
        out.push('\n');
    }

    out
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
