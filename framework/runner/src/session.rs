use chrono::{SecondsFormat, Utc};
use load_suite_model::{append_run_result, file_safe_label, AggregateSummary, RunResult};
use std::path::{Path, PathBuf};

/// Where a suite invocation writes its output, and what it is called.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Evidence files and the result journal go here
    pub output_dir: PathBuf,
    /// Rendered reports go here
    pub report_dir: PathBuf,
    /// The generation time shown in reports and embedded in file names
    pub label: String,
    /// Distinguishes journals of sessions that share a label
    pub session_id: String,
}

impl SessionConfig {
    pub fn new<O, R>(output_dir: O, report_dir: R) -> Self
    where
        O: Into<PathBuf>,
        R: Into<PathBuf>,
    {
        Self {
            output_dir: output_dir.into(),
            report_dir: report_dir.into(),
            label: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            session_id: nanoid::nanoid!(8),
        }
    }

    /// Fix the label, for reproducible report output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn journal_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "run_results-{}-{}.jsonl",
            file_safe_label(&self.label),
            self.session_id
        ))
    }
}

/// The results of one suite invocation, in execution order.
///
/// Results can only be appended. Each one is also appended to the session journal as soon as it
/// is recorded, so a later failure cannot lose completed measurements.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    results: Vec<RunResult>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn record(&mut self, result: RunResult) {
        let journal = self.config.journal_path();
        if let Err(e) = flush(&result, &journal) {
            log::error!(
                "Failed to append result for '{}' to {}: {e}",
                result.scenario.name,
                journal.display()
            );
        }
        self.results.push(result);
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn summarize(&self) -> AggregateSummary {
        AggregateSummary::from_results(&self.results)
    }
}

fn flush(result: &RunResult, journal: &Path) -> anyhow::Result<()> {
    if let Some(parent) = journal.parent() {
        std::fs::create_dir_all(parent)?;
    }
    append_run_result(result, journal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use load_suite_model::{load_run_results, MetricsSnapshot, ScenarioDescriptor};

    fn passed(name: &str) -> RunResult {
        RunResult::passed(
            ScenarioDescriptor::new(name, format!("{name}.js"), name),
            1.0,
            Utc::now(),
            MetricsSnapshot::default(),
        )
    }

    #[test]
    fn records_in_order_and_journals_each_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new(dir.path().join("results"), dir.path().join("reports"))
            .with_label("2024-03-01T12:00:00.000Z");
        let mut session = Session::new(config);

        session.record(passed("first"));
        session.record(passed("second"));

        let names = session
            .results()
            .iter()
            .map(|r| r.scenario.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["first", "second"], names);

        let journal = session.config().journal_path();
        assert!(journal
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("run_results-2024-03-01T12-00-00-000Z-"));
        pretty_assertions::assert_eq!(session.results(), load_run_results(&journal).unwrap());
    }

    #[test]
    fn journal_failure_does_not_drop_the_result() {
        let dir = tempfile::tempdir().unwrap();
        // a file where the output directory should be
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "").unwrap();

        let mut session = Session::new(SessionConfig::new(&blocked, dir.path()));
        session.record(passed("kept"));

        assert_eq!(1, session.results().len());
        assert_eq!(1, session.summarize().passed);
    }

    #[test]
    fn summary_is_recomputed_from_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SessionConfig::new(dir.path(), dir.path()));
        assert_eq!(0, session.summarize().total);

        session.record(passed("one"));
        assert_eq!(session.summarize(), session.summarize());
        assert_eq!(1, session.summarize().total);
    }
}
