//! Metrics from the newline delimited event stream the engine writes during a run.
//!
//! Each line is one record for one metric:
//!
//! ```json
//! {"type":"Metric","metric":"http_req_duration","data":{"type":"trend","value":112.5}}
//! ```
//!
//! Records that only declare a metric (no `value`) set its kind for later `Point` records of the
//! same metric, which carry the samples in the engine's native output.

use crate::error::ExtractionError;
use crate::field::{Extraction, SnapshotBuilder};
use load_suite_model::{format_bytes, round_to, CheckStats, DurationStats, Percentage};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::BufRead as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Rate,
    Trend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub metric: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    #[serde(rename = "type", default)]
    pub kind: Option<MetricKind>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Reads event records, one JSON object per line.
#[derive(Debug, Default)]
pub struct EventStreamReader {
    /// Whether to skip lines that are not valid records instead of failing.
    pub allow_invalid_entries: bool,
}

impl EventStreamReader {
    /// A reader that skips invalid lines, which is how run evidence is read.
    pub fn lenient() -> Self {
        Self {
            allow_invalid_entries: true,
        }
    }

    /// Feeds every record from `reader` into `accumulator`.
    pub fn read_into<R>(
        &self,
        reader: R,
        accumulator: &mut EventAccumulator,
    ) -> Result<(), ExtractionError>
    where
        R: std::io::Read,
    {
        let mut reader = std::io::BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }

            match parse_record(&buf) {
                Ok(Some(record)) => accumulator.record(record),
                Ok(None) => {}
                Err(e) if self.allow_invalid_entries => {
                    log::trace!("Skipping invalid event record: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Parse one line of the stream, `None` for a blank line.
fn parse_record(line: &[u8]) -> Result<Option<EventRecord>, ExtractionError> {
    let line = String::from_utf8(line.to_vec())?;
    if line.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&line)?))
}

#[derive(Debug, Default, Clone, Copy)]
struct CounterTally {
    occurrences: u64,
    sum: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct RateTally {
    passed: u64,
    failed: u64,
}

/// Collects samples per metric while the stream is read.
#[derive(Debug, Default)]
pub struct EventAccumulator {
    kinds: HashMap<String, MetricKind>,
    counters: HashMap<String, CounterTally>,
    trends: HashMap<String, Vec<f64>>,
    rates: HashMap<String, RateTally>,
    gauges: HashMap<String, f64>,
}

impl EventAccumulator {
    pub fn record(&mut self, record: EventRecord) {
        if let Some(kind) = record.data.kind {
            self.kinds.insert(record.metric.clone(), kind);
        }

        let Some(value) = record.data.value else {
            return;
        };

        let Some(kind) = record
            .data
            .kind
            .or_else(|| self.kinds.get(&record.metric).copied())
        else {
            log::trace!(
                "Skipping {} sample for undeclared metric `{}`",
                record.record_type,
                record.metric
            );
            return;
        };

        match kind {
            MetricKind::Counter => {
                let tally = self.counters.entry(record.metric).or_default();
                tally.occurrences += 1;
                tally.sum += value.as_f64().unwrap_or_default();
            }
            MetricKind::Trend => {
                if let Some(sample) = value.as_f64() {
                    self.trends.entry(record.metric).or_default().push(sample);
                }
            }
            MetricKind::Rate => {
                let tally = self.rates.entry(record.metric).or_default();
                if is_truthy(&value) {
                    tally.passed += 1;
                } else {
                    tally.failed += 1;
                }
            }
            MetricKind::Gauge => {
                if let Some(sample) = value.as_f64() {
                    let max = self.gauges.entry(record.metric).or_insert(sample);
                    *max = max.max(sample);
                }
            }
        }
    }

    /// Reduce everything seen so far into a snapshot.
    pub fn finish(&self) -> Extraction {
        let mut builder = SnapshotBuilder::new("event-stream");
        builder
            .field(
                "httpRequests",
                || self.counter("http_reqs").map(|c| c.occurrences),
                |s, v| s.http_requests = v,
            )
            .field(
                "requestDuration",
                || self.trend("http_req_duration"),
                |s, v| s.request_duration = v,
            )
            .field("checks", || self.checks("checks"), |s, v| s.checks = v)
            .field(
                "requestFailureRate",
                || {
                    // a truthy sample is a failed request
                    let tally = self.rate("http_req_failed")?;
                    Ok(Percentage::from_ratio(ratio(tally.passed, tally.passed + tally.failed)))
                },
                |s, v| s.request_failure_rate = v,
            )
            .field(
                "iterations",
                || self.counter("iterations").map(|c| c.occurrences),
                |s, v| s.iterations = v,
            )
            .field(
                "maxVirtualUsers",
                || {
                    self.gauge("vus_max")
                        .or_else(|_| self.gauge("vus"))
                        .map(|max| max.round().max(0.0) as u64)
                },
                |s, v| s.max_virtual_users = v,
            )
            .field(
                "dataReceived",
                || self.bytes("data_received"),
                |s, v| s.data_received = v,
            )
            .field(
                "dataSent",
                || self.bytes("data_sent"),
                |s, v| s.data_sent = v,
            );
        builder.finish()
    }

    fn counter(&self, metric: &str) -> Result<CounterTally, ExtractionError> {
        self.counters
            .get(metric)
            .copied()
            .ok_or_else(|| ExtractionError::MissingMetric(metric.to_string()))
    }

    fn rate(&self, metric: &str) -> Result<RateTally, ExtractionError> {
        self.rates
            .get(metric)
            .copied()
            .ok_or_else(|| ExtractionError::MissingMetric(metric.to_string()))
    }

    fn gauge(&self, metric: &str) -> Result<f64, ExtractionError> {
        self.gauges
            .get(metric)
            .copied()
            .ok_or_else(|| ExtractionError::MissingMetric(metric.to_string()))
    }

    fn trend(&self, metric: &str) -> Result<DurationStats, ExtractionError> {
        let samples = self
            .trends
            .get(metric)
            .ok_or_else(|| ExtractionError::MissingMetric(metric.to_string()))?;
        reduce_trend(samples.clone())
            .ok_or_else(|| ExtractionError::MissingMetric(metric.to_string()))
    }

    fn checks(&self, metric: &str) -> Result<CheckStats, ExtractionError> {
        let tally = self.rate(metric)?;
        let total = tally.passed + tally.failed;
        Ok(CheckStats {
            total,
            passed: tally.passed,
            failed: tally.failed,
            rate: Percentage::from_ratio(ratio(tally.passed, total)),
        })
    }

    fn bytes(&self, metric: &str) -> Result<String, ExtractionError> {
        let tally = self.counter(metric)?;
        Ok(format_bytes(tally.sum.round().max(0.0) as u64))
    }
}

/// Sort the samples and reduce them to duration statistics.
///
/// `min` and `max` are the first and last sorted samples, `med` and `p95` are the samples at
/// index `floor(n * 0.5)` and `floor(n * 0.95)`.
pub fn reduce_trend(mut samples: Vec<f64>) -> Option<DurationStats> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_by(f64::total_cmp);

    let n = samples.len();
    let at = |fraction: f64| samples[((n as f64 * fraction).floor() as usize).min(n - 1)];

    Some(DurationStats {
        avg: round_to(samples.iter().sum::<f64>() / n as f64, 2),
        min: samples[0],
        max: samples[n - 1],
        med: at(0.5),
        p95: at(0.95),
    })
}

/// Read a whole event stream.
///
/// A stream that cannot be read keeps whatever was accumulated before the failure.
pub fn read_events<R>(reader: R) -> Extraction
where
    R: std::io::Read,
{
    let mut accumulator = EventAccumulator::default();
    if let Err(e) = EventStreamReader::lenient().read_into(reader, &mut accumulator) {
        log::warn!("[event-stream] Stopped reading the event stream early: {e}");
    }
    accumulator.finish()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
