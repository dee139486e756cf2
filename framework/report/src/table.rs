use load_suite_model::RunResult;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ScenarioRow {
    scenario: String,
    status: String,
    #[tabled(display = "float2")]
    duration_s: f64,
    requests: u64,
    #[tabled(display = "float2")]
    avg_ms: f64,
    #[tabled(display = "float2")]
    p95_ms: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

/// A console table with one row per result, in execution order.
pub fn results_table(results: &[RunResult]) -> Table {
    let rows = results.iter().map(|result| {
        let metrics = result.metrics.clone().unwrap_or_default();
        ScenarioRow {
            scenario: result.scenario.name.clone(),
            status: result.status.to_string(),
            duration_s: result.duration_seconds,
            requests: metrics.http_requests,
            avg_ms: metrics.request_duration.avg,
            p95_ms: metrics.request_duration.p95,
        }
    });

    let mut table = Table::new(rows);
    table.with(Style::modern());
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use load_suite_model::{MetricsSnapshot, ScenarioDescriptor};

    #[test]
    fn one_row_per_result() {
        let mut metrics = MetricsSnapshot {
            http_requests: 50,
            ..Default::default()
        };
        metrics.request_duration.avg = 120.0;
        let results = vec![
            RunResult::passed(
                ScenarioDescriptor::new("Health Check", "health.js", ""),
                1.234,
                Utc::now(),
                metrics,
            ),
            RunResult::failed(
                ScenarioDescriptor::new("Authentication", "auth.js", ""),
                0.5,
                Utc::now(),
                "connection refused",
            ),
        ];

        let table = results_table(&results).to_string();
        assert!(table.contains("Health Check"));
        assert!(table.contains("PASSED"));
        assert!(table.contains("FAILED"));
        assert!(table.contains("120.00"));
        assert!(table.contains("1.23"));
        // header plus two rows
        assert_eq!(3, table.lines().filter(|line| line.starts_with('│')).count());
    }
}
