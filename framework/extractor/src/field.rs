use crate::error::ExtractionError;
use load_suite_model::MetricsSnapshot;

/// The outcome of running an extraction strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub snapshot: MetricsSnapshot,
    /// Fields that could not be derived and were left at their default, in rule order
    pub defaulted: Vec<&'static str>,
}

/// Builds a [MetricsSnapshot] one field at a time.
///
/// Each field is extracted on its own, a failure is logged and leaves only that field at its
/// default. Nothing a field extractor returns can stop the remaining fields from being extracted.
pub(crate) struct SnapshotBuilder {
    strategy: &'static str,
    extraction: Extraction,
}

impl SnapshotBuilder {
    pub(crate) fn new(strategy: &'static str) -> Self {
        Self {
            strategy,
            extraction: Extraction::default(),
        }
    }

    pub(crate) fn field<T, E, S>(&mut self, name: &'static str, extract: E, set: S) -> &mut Self
    where
        E: FnOnce() -> Result<T, ExtractionError>,
        S: FnOnce(&mut MetricsSnapshot, T),
    {
        match extract() {
            Ok(value) => set(&mut self.extraction.snapshot, value),
            Err(e) => {
                log::warn!(
                    "[{}] Could not extract `{name}`, keeping the default: {e}",
                    self.strategy
                );
                self.extraction.defaulted.push(name);
            }
        }
        self
    }

    pub(crate) fn finish(self) -> Extraction {
        self.extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_field_does_not_stop_the_next() {
        let mut builder = SnapshotBuilder::new("test");
        builder
            .field(
                "httpRequests",
                || Err(ExtractionError::PatternNotMatched { field: "httpRequests" }),
                |s, v| s.http_requests = v,
            )
            .field("iterations", || Ok(7), |s, v| s.iterations = v);

        let extraction = builder.finish();
        assert_eq!(0, extraction.snapshot.http_requests);
        assert_eq!(7, extraction.snapshot.iterations);
        assert_eq!(vec!["httpRequests"], extraction.defaulted);
    }
}
