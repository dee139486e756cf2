//! Metrics from the structured summary document the engine exports at the end of a run.
//!
//! The document maps metric names to their values:
//!
//! ```json
//! { "metrics": { "http_reqs": { "values": { "count": 120, "rate": 1.2 } } } }
//! ```
//!
//! The engine's own summary export leaves out the `values` wrapper, both shapes are accepted.

use crate::error::ExtractionError;
use crate::field::{Extraction, SnapshotBuilder};
use load_suite_model::{format_bytes, round_to, CheckStats, Percentage};
use serde_json::{Map, Value};

const P95: &str = "p(95)";

/// Read a summary document from its JSON text.
///
/// A document that is not valid JSON defaults every field.
pub fn read_summary_str(json: &str) -> Extraction {
    match serde_json::from_str::<Value>(json) {
        Ok(document) => read_summary(&document),
        Err(e) => {
            log::warn!("[summary-read] Summary document is not valid JSON: {e}");
            read_summary(&Value::Null)
        }
    }
}

/// Read an already parsed summary document.
pub fn read_summary(document: &Value) -> Extraction {
    let mut builder = SnapshotBuilder::new("summary-read");
    builder
        .field(
            "httpRequests",
            || count(document, "http_reqs", "count"),
            |s, v| s.http_requests = v,
        )
        .field(
            "requestDuration.avg",
            || duration(document, "avg"),
            |s, v| s.request_duration.avg = v,
        )
        .field(
            "requestDuration.min",
            || duration(document, "min"),
            |s, v| s.request_duration.min = v,
        )
        .field(
            "requestDuration.max",
            || duration(document, "max"),
            |s, v| s.request_duration.max = v,
        )
        .field(
            "requestDuration.med",
            || duration(document, "med"),
            |s, v| s.request_duration.med = v,
        )
        .field(
            "requestDuration.p95",
            || duration(document, P95),
            |s, v| s.request_duration.p95 = v,
        )
        .field("checks", || checks(document), |s, v| s.checks = v)
        .field(
            "requestFailureRate",
            || rate(document, "http_req_failed").map(Percentage::from_ratio),
            |s, v| s.request_failure_rate = v,
        )
        .field(
            "iterations",
            || count(document, "iterations", "count"),
            |s, v| s.iterations = v,
        )
        .field(
            "maxVirtualUsers",
            || {
                count(document, "vus_max", "max").or_else(|_| count(document, "vus_max", "value"))
            },
            |s, v| s.max_virtual_users = v,
        )
        .field(
            "dataReceived",
            || count(document, "data_received", "count").map(format_bytes),
            |s, v| s.data_received = v,
        )
        .field(
            "dataSent",
            || count(document, "data_sent", "count").map(format_bytes),
            |s, v| s.data_sent = v,
        );
    builder.finish()
}

fn metric_values<'a>(
    document: &'a Value,
    metric: &str,
) -> Result<&'a Map<String, Value>, ExtractionError> {
    let entry = document
        .get("metrics")
        .and_then(|metrics| metrics.get(metric))
        .ok_or_else(|| ExtractionError::MissingMetric(metric.to_string()))?;

    entry
        .get("values")
        .unwrap_or(entry)
        .as_object()
        .ok_or_else(|| ExtractionError::MissingKey {
            metric: metric.to_string(),
            key: "values".to_string(),
        })
}

fn number(document: &Value, metric: &str, key: &str) -> Result<f64, ExtractionError> {
    metric_values(document, metric)?
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ExtractionError::MissingKey {
            metric: metric.to_string(),
            key: key.to_string(),
        })
}

fn count(document: &Value, metric: &str, key: &str) -> Result<u64, ExtractionError> {
    number(document, metric, key).map(|value| value.round().max(0.0) as u64)
}

fn duration(document: &Value, key: &str) -> Result<f64, ExtractionError> {
    number(document, "http_req_duration", key).map(|value| round_to(value, 2))
}

/// The ratio of a rate metric.
///
/// Under `rate` with the `values` wrapper, under `value` in the engine's own export, and otherwise
/// derived from `passes` and `fails`.
fn rate(document: &Value, metric: &str) -> Result<f64, ExtractionError> {
    let direct = number(document, metric, "rate").or_else(|_| number(document, metric, "value"));
    if let Ok(rate) = direct {
        return Ok(rate);
    }

    let passes = count(document, metric, "passes")?;
    let total = passes + count(document, metric, "fails")?;
    if total == 0 {
        return Err(ExtractionError::MissingKey {
            metric: metric.to_string(),
            key: "rate".to_string(),
        });
    }
    Ok(passes as f64 / total as f64)
}

fn checks(document: &Value) -> Result<CheckStats, ExtractionError> {
    let passed = count(document, "checks", "passes")?;
    let failed = count(document, "checks", "fails")?;

    Ok(CheckStats {
        total: passed + failed,
        passed,
        failed,
        rate: Percentage::from_ratio(rate(document, "checks")?),
    })
}
