//! Reports for a load suite session.
//!
//! Renderers only read the results they are given, they never run or re-extract anything.

mod csv;
mod error;
mod html;
mod table;
mod writer;

use chrono::SecondsFormat;
use load_suite_model::RunResult;

pub use csv::{render_csv, CSV_HEADER};
pub use error::ReportWriteError;
pub use html::render_html;
pub use table::results_table;
pub use writer::{ReportArtifact, ReportArtifacts, ReportWriter};

fn timestamp(result: &RunResult) -> String {
    result
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
