/// Why a single metric field could not be derived from the run evidence.
///
/// These never escape extraction, the affected field keeps its default and the error is logged.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Line is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("No match for `{field}` in console output")]
    PatternNotMatched { field: &'static str },
    #[error("Metric `{0}` not present")]
    MissingMetric(String),
    #[error("Metric `{metric}` has no `{key}` value")]
    MissingKey { metric: String, key: String },
    #[error("No {0} was captured")]
    NotCaptured(&'static str),
    #[error("`{value}` is not a valid value for `{field}`")]
    InvalidValue { field: &'static str, value: String },
}
