//! Metrics from the end of run summary the engine prints to the console.
//!
//! The console summary is free-form text, one metric per line:
//!
//! ```text
//!      checks.........................: 95.00% ✓ 95       ✗ 5
//!      data_received..................: 1.2 MB 20 kB/s
//!      http_req_duration..............: avg=120.5ms min=80ms med=110ms max=300ms p(90)=200ms p(95)=250ms
//!      http_reqs......................: 120    1.2/s
//! ```
//!
//! Each field has its own rule, a line that is missing or does not parse only affects that field.

use crate::error::ExtractionError;
use crate::field::{Extraction, SnapshotBuilder};
use load_suite_model::{round_to, Percentage};
use regex::Regex;
use std::sync::LazyLock;

macro_rules! metric_line {
    ($name:literal, $rest:literal) => {
        LazyLock::new(|| {
            Regex::new(concat!(r"(?m)^[ \t]*[✓✗]?[ \t]*", $name, r"\.*:[ \t]*", $rest))
                .expect("Invalid console metric pattern")
        })
    };
}

static HTTP_REQS: LazyLock<Regex> = metric_line!("http_reqs", r"(\d+)");
static ITERATIONS: LazyLock<Regex> = metric_line!("iterations", r"(\d+)");
static DURATION: LazyLock<Regex> = metric_line!("http_req_duration", r"(.+)$");
static CHECKS: LazyLock<Regex> =
    metric_line!("checks", r"([\d.]+)%[ \t]+✓[ \t]*(\d+)[ \t]+✗[ \t]*(\d+)");
static CHECKS_SUCCEEDED: LazyLock<Regex> =
    metric_line!("checks_succeeded", r"([\d.]+)%[ \t]+(\d+)[ \t]+out of[ \t]+(\d+)");
static FAILED: LazyLock<Regex> = metric_line!("http_req_failed", r"([\d.]+)%");
static VUS_MAX: LazyLock<Regex> = metric_line!("vus_max", r"(\d+)");
static DATA_RECEIVED: LazyLock<Regex> =
    metric_line!("data_received", r"([\d.]+)[ \t]*([kKMGT]?i?B)\b");
static DATA_SENT: LazyLock<Regex> = metric_line!("data_sent", r"([\d.]+)[ \t]*([kKMGT]?i?B)\b");

static STAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(avg|min|med|max|p\(\d+(?:\.\d+)?\))=(\S+)")
        .expect("Invalid duration stat pattern")
});
static DURATION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d.]+)(µs|us|ms|ns|s|m|h)").expect("Invalid duration part pattern")
});

/// Scan the full console output of a run.
pub fn scan(text: &str) -> Extraction {
    let mut builder = SnapshotBuilder::new("text-scan");
    builder
        .field(
            "httpRequests",
            || capture_number(&HTTP_REQS, text, "httpRequests"),
            |s, v| s.http_requests = v,
        )
        .field(
            "requestDuration.avg",
            || duration_stat(text, "avg", "requestDuration.avg"),
            |s, v| s.request_duration.avg = v,
        )
        .field(
            "requestDuration.min",
            || duration_stat(text, "min", "requestDuration.min"),
            |s, v| s.request_duration.min = v,
        )
        .field(
            "requestDuration.max",
            || duration_stat(text, "max", "requestDuration.max"),
            |s, v| s.request_duration.max = v,
        )
        .field(
            "requestDuration.med",
            || duration_stat(text, "med", "requestDuration.med"),
            |s, v| s.request_duration.med = v,
        )
        .field(
            "requestDuration.p95",
            || duration_stat(text, "p(95)", "requestDuration.p95"),
            |s, v| s.request_duration.p95 = v,
        )
        .field("checks", || checks(text), |s, v| s.checks = v)
        .field(
            "requestFailureRate",
            || {
                let caps = captures(&FAILED, text, "requestFailureRate")?;
                parse_f64(&caps[1], "requestFailureRate").map(Percentage::from_percent)
            },
            |s, v| s.request_failure_rate = v,
        )
        .field(
            "iterations",
            || capture_number(&ITERATIONS, text, "iterations"),
            |s, v| s.iterations = v,
        )
        .field(
            "maxVirtualUsers",
            || capture_number(&VUS_MAX, text, "maxVirtualUsers"),
            |s, v| s.max_virtual_users = v,
        )
        .field(
            "dataReceived",
            || data_size(&DATA_RECEIVED, text, "dataReceived"),
            |s, v| s.data_received = v,
        )
        .field(
            "dataSent",
            || data_size(&DATA_SENT, text, "dataSent"),
            |s, v| s.data_sent = v,
        );
    builder.finish()
}

fn captures<'t>(
    pattern: &Regex,
    text: &'t str,
    field: &'static str,
) -> Result<regex::Captures<'t>, ExtractionError> {
    pattern
        .captures(text)
        .ok_or(ExtractionError::PatternNotMatched { field })
}

fn capture_number(
    pattern: &Regex,
    text: &str,
    field: &'static str,
) -> Result<u64, ExtractionError> {
    let caps = captures(pattern, text, field)?;
    parse_u64(&caps[1], field)
}

fn parse_u64(value: &str, field: &'static str) -> Result<u64, ExtractionError> {
    value.parse().map_err(|_| ExtractionError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn parse_f64(value: &str, field: &'static str) -> Result<f64, ExtractionError> {
    value.parse().map_err(|_| ExtractionError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

fn duration_stat(text: &str, key: &str, field: &'static str) -> Result<f64, ExtractionError> {
    let line = captures(&DURATION, text, field)?;
    let raw = STAT
        .captures_iter(&line[1])
        .find(|caps| &caps[1] == key)
        .map(|caps| caps[2].to_string())
        .ok_or(ExtractionError::PatternNotMatched { field })?;

    parse_duration_ms(&raw)
        .map(|ms| round_to(ms, 2))
        .ok_or(ExtractionError::InvalidValue { field, value: raw })
}

/// Parse an engine duration such as `120.5ms`, `950µs` or `1m2.5s` into milliseconds.
pub(crate) fn parse_duration_ms(raw: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut consumed = 0;
    for caps in DURATION_PART.captures_iter(raw) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();

        let value: f64 = caps[1].parse().ok()?;
        total += match &caps[2] {
            "ns" => value / 1_000_000.0,
            "µs" | "us" => value / 1_000.0,
            "ms" => value,
            "s" => value * 1_000.0,
            "m" => value * 60_000.0,
            "h" => value * 3_600_000.0,
            _ => return None,
        };
    }

    (consumed > 0 && consumed == raw.len()).then_some(total)
}

fn checks(text: &str) -> Result<load_suite_model::CheckStats, ExtractionError> {
    let (rate, passed, failed) = if let Some(caps) = CHECKS.captures(text) {
        (
            parse_f64(&caps[1], "checks")?,
            parse_u64(&caps[2], "checks")?,
            parse_u64(&caps[3], "checks")?,
        )
    } else {
        let caps = captures(&CHECKS_SUCCEEDED, text, "checks")?;
        let passed = parse_u64(&caps[2], "checks")?;
        let total = parse_u64(&caps[3], "checks")?;
        (
            parse_f64(&caps[1], "checks")?,
            passed,
            total.saturating_sub(passed),
        )
    };

    Ok(load_suite_model::CheckStats {
        total: passed + failed,
        passed,
        failed,
        rate: Percentage::from_percent(rate),
    })
}

fn data_size(pattern: &Regex, text: &str, field: &'static str) -> Result<String, ExtractionError> {
    let caps = captures(pattern, text, field)?;
    // validate the number, the size itself is carried as printed
    parse_f64(&caps[1], field)?;
    Ok(format!("{} {}", &caps[1], &caps[2]))
}
