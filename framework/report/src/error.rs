use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportWriteError {
    #[error("Failed to create report directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write report {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render report: {0}")]
    Template(#[from] minijinja::Error),
}
