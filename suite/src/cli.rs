use clap::Parser;
use load_suite_runner::prelude::EvidenceMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct LoadSuiteCli {
    /// A suite file listing the scenarios to run.
    ///
    /// When not given, the built-in catalogue of scenarios is run.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Which evidence to ask the engine for. Metrics are extracted from the richest evidence the
    /// engine actually produced, falling back to its console output.
    ///
    /// Overrides the suite file. Defaults to `summary`.
    #[clap(long, value_enum)]
    pub evidence: Option<EvidenceMode>,

    /// Directory for the evidence of each scenario and the result journal. Defaults to `results`.
    #[clap(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for the HTML and CSV reports. Defaults to `reports`.
    #[clap(long)]
    pub report_dir: Option<PathBuf>,

    /// Path to the engine binary.
    ///
    /// Otherwise the `LOAD_SUITE_ENGINE_PATH` environment variable is used, and then `k6` from the `PATH`.
    #[clap(long)]
    pub engine: Option<PathBuf>,

    /// Only run the scenario with this script. Can be given multiple times.
    #[clap(long = "only", value_name = "SCRIPT")]
    pub only: Vec<String>,

    /// Extra argument passed to the engine before the script, for example `--engine-arg=--quiet`.
    /// Can be given multiple times.
    #[clap(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Fix the generation label used in the reports and their file names, instead of the current time.
    #[clap(long)]
    pub label: Option<String>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_everything_unset() {
        let cli = LoadSuiteCli::parse_from(["load-suite"]);
        assert!(cli.config.is_none());
        assert!(cli.evidence.is_none());
        assert!(cli.only.is_empty());
        assert!(!cli.no_progress);
    }

    #[test]
    fn parses_repeated_options() {
        let cli = LoadSuiteCli::parse_from([
            "load-suite",
            "--evidence",
            "event-stream",
            "--only",
            "scenarios/health-check.js",
            "--only",
            "scenarios/spike.js",
            "--engine-arg=--quiet",
            "--engine-arg",
            "--no-color",
            "--no-progress",
        ]);
        assert_eq!(Some(EvidenceMode::EventStream), cli.evidence);
        assert_eq!(
            vec!["scenarios/health-check.js", "scenarios/spike.js"],
            cli.only
        );
        assert_eq!(vec!["--quiet", "--no-color"], cli.engine_args);
        assert!(cli.no_progress);
    }
}
