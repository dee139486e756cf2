use crate::engine::{Engine, EvidenceMode, Invocation};
use crate::progress::SuiteProgress;
use crate::session::Session;
use chrono::Utc;
use load_suite_extractor::{Evidence, MetricsExtractor};
use load_suite_model::{RunResult, ScenarioDescriptor};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The evidence files of one scenario, named by its position in the suite and its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidencePaths {
    pub console: PathBuf,
    pub summary: PathBuf,
    pub events: PathBuf,
}

impl EvidencePaths {
    pub fn new(output_dir: &Path, index: usize, scenario: &ScenarioDescriptor) -> Self {
        let stem = format!("{:02}-{}", index + 1, scenario.slug());
        Self {
            console: output_dir.join(format!("{stem}.console.log")),
            summary: output_dir.join(format!("{stem}.summary.json")),
            events: output_dir.join(format!("{stem}.events.jsonl")),
        }
    }

    /// Remove artifacts left by an earlier invocation, so they are not mistaken for evidence of
    /// this run.
    fn clear_stale(&self) {
        for path in [&self.summary, &self.events] {
            match std::fs::remove_file(path) {
                Ok(()) => log::debug!("Removed stale evidence {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove stale evidence {}: {e}", path.display()),
            }
        }
    }
}

/// Runs scenarios through an [Engine], one at a time.
pub struct RunExecutor<E> {
    engine: E,
    mode: EvidenceMode,
}

impl<E> RunExecutor<E>
where
    E: Engine,
{
    pub fn new(engine: E, mode: EvidenceMode) -> Self {
        Self { engine, mode }
    }

    /// Run every scenario in order and record each result in the session.
    ///
    /// A failed scenario is recorded and the suite carries on with the next one. The only error is
    /// failing to create the output directory, before anything has run.
    pub fn run_suite(
        &self,
        scenarios: &[ScenarioDescriptor],
        session: &mut Session,
        progress: &SuiteProgress,
    ) -> std::io::Result<()> {
        let output_dir = session.config().output_dir.clone();
        std::fs::create_dir_all(&output_dir)?;

        for (index, scenario) in scenarios.iter().enumerate() {
            log::info!(
                "Running scenario {}/{}: {} ({})",
                index + 1,
                scenarios.len(),
                scenario.name,
                scenario.script_ref
            );
            progress.start(&scenario.name);

            let result = self.execute(index, scenario, &output_dir);
            progress.println(format!(
                "{:<6} {} ({:.2}s)",
                result.status, scenario.name, result.duration_seconds
            ));

            session.record(result);
            progress.advance();
        }

        progress.finish();
        Ok(())
    }

    /// Run a single scenario. Never fails, a scenario the engine could not complete produces a
    /// failed result.
    pub fn execute(
        &self,
        index: usize,
        scenario: &ScenarioDescriptor,
        output_dir: &Path,
    ) -> RunResult {
        let paths = EvidencePaths::new(output_dir, index, scenario);
        paths.clear_stale();

        let invocation = Invocation {
            script_ref: &scenario.script_ref,
            summary_path: (self.mode == EvidenceMode::Summary).then_some(paths.summary.as_path()),
            events_path: (self.mode == EvidenceMode::EventStream).then_some(paths.events.as_path()),
        };

        let timestamp = Utc::now();
        let started = Instant::now();
        let outcome = self.engine.invoke(&invocation);
        let duration_seconds = started.elapsed().as_secs_f64();

        match outcome {
            Ok(output) => {
                save_console(&paths.console, &output.stdout);

                let evidence = Evidence {
                    console: Some(output.stdout),
                    summary_path: invocation.summary_path.map(Path::to_path_buf),
                    events_path: invocation.events_path.map(Path::to_path_buf),
                }
                .existing();
                let extractor = MetricsExtractor::select(&evidence);
                log::debug!(
                    "Extracting metrics for '{}' with {}",
                    scenario.name,
                    extractor.name()
                );
                let metrics = extractor.extract(&evidence);

                log::info!(
                    "Scenario '{}' passed in {duration_seconds:.2}s with {} requests",
                    scenario.name,
                    metrics.http_requests
                );
                RunResult::passed(scenario.clone(), duration_seconds, timestamp, metrics)
            }
            Err(e) => {
                if let Some(console) = e.console() {
                    save_console(&paths.console, console);
                }
                log::error!("Scenario '{}' failed: {e}", scenario.name);
                RunResult::failed(scenario.clone(), duration_seconds, timestamp, e.to_string())
            }
        }
    }
}

fn save_console(path: &Path, console: &str) {
    if let Err(e) = std::fs::write(path, console) {
        log::warn!("Failed to save console output to {}: {e}", path.display());
    }
}
