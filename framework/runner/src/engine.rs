//! The interface to the external load generation engine.

use crate::error::ScenarioExecutionError;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable to override the path to the engine binary.
pub const ENGINE_PATH_ENV: &str = "LOAD_SUITE_ENGINE_PATH";

/// The engine binary looked up in the user's `PATH` when nothing else is configured.
pub const DEFAULT_ENGINE: &str = "k6";

/// Which evidence to ask the engine for, in addition to its console output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceMode {
    /// Console output only
    Console,
    /// A structured summary document written at the end of the run
    #[default]
    Summary,
    /// A newline delimited stream of metric samples
    EventStream,
}

/// One engine run, for one scenario.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub script_ref: &'a str,
    /// Where the summary document should be written, if requested
    pub summary_path: Option<&'a Path>,
    /// Where the event stream should be written, if requested
    pub events_path: Option<&'a Path>,
}

#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a scenario and blocks until it is done.
pub trait Engine {
    fn invoke(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, ScenarioExecutionError>;
}

/// Runs the engine as a child process.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandEngine {
    pub fn new<P>(program: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments passed to every run, before the script.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The command line arguments for an invocation.
    pub fn args(&self, invocation: &Invocation<'_>) -> Vec<String> {
        let mut args = vec!["run".to_string()];
        if let Some(path) = invocation.summary_path {
            args.push("--summary-export".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        if let Some(path) = invocation.events_path {
            args.push("--out".to_string());
            args.push(format!("json={}", path.to_string_lossy()));
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(invocation.script_ref.to_string());
        args
    }
}

impl Engine for CommandEngine {
    fn invoke(&self, invocation: &Invocation<'_>) -> Result<EngineOutput, ScenarioExecutionError> {
        let args = self.args(invocation);
        log::debug!("Running {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ScenarioExecutionError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        log::debug!("Engine finished with status: {}", output.status);

        if output.status.success() {
            Ok(EngineOutput { stdout, stderr })
        } else {
            Err(ScenarioExecutionError::NonZeroExit {
                status: output.status.to_string(),
                message: failure_message(&stderr),
                console: stdout,
            })
        }
    }
}

/// The last few lines the engine wrote to stderr, which is where it reports why it stopped.
fn failure_message(stderr: &str) -> String {
    const MAX_LINES: usize = 5;

    let lines = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    if lines.is_empty() {
        return "no error output".to_string();
    }
    lines[lines.len().saturating_sub(MAX_LINES)..].join("\n")
}

/// Get the path to the engine binary.
///
/// An explicit path wins. Otherwise the [ENGINE_PATH_ENV] environment variable is used and when
/// that is not set either, [DEFAULT_ENGINE] is looked up in the user's `PATH`.
pub fn engine_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    resolve_engine_path(explicit, env::var(ENGINE_PATH_ENV).ok())
}

fn resolve_engine_path(
    explicit: Option<PathBuf>,
    env_value: Option<String>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Engine path '{}' doesn't exist", path.display());
        }
        return Ok(path);
    }

    match env_value.as_deref() {
        Some("") => {
            bail!("'{ENGINE_PATH_ENV}' set to empty string");
        }
        Some(DEFAULT_ENGINE) | None => {
            log::debug!("'{ENGINE_PATH_ENV}' is not a path so looking in user's 'PATH'");
            which::which(DEFAULT_ENGINE).with_context(|| {
                format!(
                    "Engine binary '{DEFAULT_ENGINE}' not found in PATH. Please install it or set '{ENGINE_PATH_ENV}' to the correct path."
                )
            })
        }
        Some(path) => {
            let engine_path = PathBuf::from(path);
            if !engine_path.exists() {
                bail!(
                    "Path to engine binary overwritten with '{ENGINE_PATH_ENV}={path}' but that path doesn't exist",
                    path = engine_path.display()
                );
            }
            Ok(engine_path)
        }
    }
}
