//! Turns the evidence a load engine leaves behind into a [MetricsSnapshot].
//!
//! There are three strategies, one per evidence format, behind the single [MetricsExtractor]
//! interface. None of them fail: a metric that cannot be derived keeps its default and the reason
//! is logged.

mod error;
mod event_stream;
mod field;
mod summary_read;
mod text_scan;

use load_suite_model::MetricsSnapshot;
use std::path::{Path, PathBuf};

pub use error::ExtractionError;
pub use event_stream::{
    read_events, reduce_trend, EventAccumulator, EventData, EventRecord, EventStreamReader,
    MetricKind,
};
pub use field::Extraction;
pub use summary_read::{read_summary, read_summary_str};
pub use text_scan::scan;

/// The evidence captured for one scenario run.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    /// Everything the engine printed to stdout
    pub console: Option<String>,
    /// Path to the structured summary document, if one was written
    pub summary_path: Option<PathBuf>,
    /// Path to the event stream, if one was written
    pub events_path: Option<PathBuf>,
}

impl Evidence {
    pub fn console(text: impl Into<String>) -> Self {
        Self {
            console: Some(text.into()),
            ..Default::default()
        }
    }

    /// Keep only the artifact paths that exist on disk.
    pub fn existing(mut self) -> Self {
        self.summary_path = self.summary_path.filter(|p| p.is_file());
        self.events_path = self.events_path.filter(|p| p.is_file());
        self
    }
}

/// How to turn evidence into metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsExtractor {
    /// Pattern rules over the console output
    TextScan,
    /// Keyed lookups in the summary document
    SummaryRead,
    /// Per metric accumulation over the event stream
    EventStreamRead,
}

impl MetricsExtractor {
    /// Pick the strategy for the richest evidence available.
    ///
    /// An event stream is preferred over a summary document, which is preferred over console text.
    pub fn select(evidence: &Evidence) -> Self {
        if evidence.events_path.is_some() {
            MetricsExtractor::EventStreamRead
        } else if evidence.summary_path.is_some() {
            MetricsExtractor::SummaryRead
        } else {
            MetricsExtractor::TextScan
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricsExtractor::TextScan => "text-scan",
            MetricsExtractor::SummaryRead => "summary-read",
            MetricsExtractor::EventStreamRead => "event-stream",
        }
    }

    pub fn extract(&self, evidence: &Evidence) -> MetricsSnapshot {
        self.extract_detailed(evidence).snapshot
    }

    /// Like [MetricsExtractor::extract] but also reports which fields were left at their default.
    pub fn extract_detailed(&self, evidence: &Evidence) -> Extraction {
        match self {
            MetricsExtractor::TextScan => scan(evidence.console.as_deref().unwrap_or_default()),
            MetricsExtractor::SummaryRead => match read_artifact(evidence.summary_path.as_deref()) {
                Ok(json) => read_summary_str(&json),
                Err(e) => self.unavailable(e),
            },
            MetricsExtractor::EventStreamRead => {
                match open_artifact(evidence.events_path.as_deref()) {
                    Ok(file) => read_events(file),
                    Err(e) => self.unavailable(e),
                }
            }
        }
    }

    fn unavailable(&self, e: ExtractionError) -> Extraction {
        log::warn!("[{}] Evidence unavailable, using default metrics: {e}", self.name());
        match self {
            MetricsExtractor::TextScan => scan(""),
            MetricsExtractor::SummaryRead => read_summary_str("{}"),
            MetricsExtractor::EventStreamRead => read_events(std::io::empty()),
        }
    }
}

fn open_artifact(path: Option<&Path>) -> Result<std::fs::File, ExtractionError> {
    let path = path.ok_or(ExtractionError::NotCaptured("event stream"))?;
    Ok(std::fs::File::open(path)?)
}

fn read_artifact(path: Option<&Path>) -> Result<String, ExtractionError> {
    let path = path.ok_or(ExtractionError::NotCaptured("summary document"))?;
    Ok(std::fs::read_to_string(path)?)
}
