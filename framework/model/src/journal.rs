use crate::RunResult;
use std::io::{BufRead, Write};
use std::path::Path;

/// Errors from reading or writing the run result journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Append a run result to a journal file
///
/// The result is serialized to JSON and written as a single line followed by a newline, so a suite
/// that is interrupted part way keeps every result that was appended before the interruption. The
/// recommended file extension is `.jsonl`.
pub fn append_run_result(run_result: &RunResult, path: &Path) -> Result<(), JournalError> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_result(run_result, &mut file)?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

/// Serialize a run result to a writer
pub fn store_run_result<W: Write>(
    run_result: &RunResult,
    writer: &mut W,
) -> Result<(), JournalError> {
    serde_json::to_writer(writer, run_result)?;
    Ok(())
}

/// Load run results from a journal file
///
/// The file should contain one JSON object per line, as written by [append_run_result]. Blank
/// lines are ignored.
pub fn load_run_results(path: &Path) -> Result<Vec<RunResult>, JournalError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut results = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        results.push(serde_json::from_str(&line)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricsSnapshot, ScenarioDescriptor};
    use chrono::{TimeZone, Utc};

    fn sample_results() -> Vec<RunResult> {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        vec![
            RunResult::passed(
                ScenarioDescriptor::new("Health check", "health.js", "Pings the health endpoint"),
                3.25,
                timestamp,
                MetricsSnapshot {
                    http_requests: 42,
                    ..Default::default()
                },
            ),
            RunResult::failed(
                ScenarioDescriptor::new("Login", "login.js", "Authenticates users"),
                0.1,
                timestamp,
                "connection refused",
            ),
        ]
    }

    #[test]
    fn appended_results_load_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_results.jsonl");

        let results = sample_results();
        for result in &results {
            append_run_result(result, &path).unwrap();
        }

        let loaded = load_run_results(&path).unwrap();
        pretty_assertions::assert_eq!(results, loaded);
    }

    #[test]
    fn one_line_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_results.jsonl");
        for result in &sample_results() {
            append_run_result(result, &path).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(2, content.lines().count());
    }

    #[test]
    fn malformed_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_results.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();

        assert!(matches!(load_run_results(&path), Err(JournalError::Serde(_))));
    }
}
