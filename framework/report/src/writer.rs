use crate::csv::render_csv;
use crate::error::ReportWriteError;
use crate::html::render_html;
use load_suite_model::{file_safe_label, RunResult};
use std::path::{Path, PathBuf};

/// A rendered report and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub content: String,
}

impl ReportArtifact {
    pub fn html(
        results: &[RunResult],
        label: &str,
        report_dir: &Path,
    ) -> Result<Self, ReportWriteError> {
        Ok(Self {
            path: report_dir.join(format!("load-test-report-{}.html", file_safe_label(label))),
            content: render_html(results, label)?,
        })
    }

    pub fn csv(results: &[RunResult], label: &str, report_dir: &Path) -> Self {
        Self {
            path: report_dir.join(format!("load-test-results-{}.csv", file_safe_label(label))),
            content: render_csv(results),
        }
    }

    fn write(&self) -> Result<(), ReportWriteError> {
        std::fs::write(&self.path, &self.content).map_err(|source| ReportWriteError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub html: ReportArtifact,
    pub csv: ReportArtifact,
}

/// Writes the reports of a session into the report directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Render and write both reports. Attempted once, any failure is returned to the caller.
    pub fn write(
        &self,
        results: &[RunResult],
        label: &str,
    ) -> Result<ReportArtifacts, ReportWriteError> {
        std::fs::create_dir_all(&self.report_dir).map_err(|source| {
            ReportWriteError::CreateDir {
                path: self.report_dir.clone(),
                source,
            }
        })?;

        let html = ReportArtifact::html(results, label, &self.report_dir)?;
        html.write()?;
        log::info!("Wrote HTML report to {}", html.path.display());

        let csv = ReportArtifact::csv(results, label, &self.report_dir);
        csv.write()?;
        log::info!("Wrote CSV results to {}", csv.path.display());

        Ok(ReportArtifacts { html, csv })
    }
}
