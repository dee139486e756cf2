use crate::cli::LoadSuiteCli;
use anyhow::{bail, Context};
use load_suite_model::ScenarioDescriptor;
use load_suite_runner::prelude::EvidenceMode;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT_DIR: &str = "results";
const DEFAULT_REPORT_DIR: &str = "reports";

/// A suite file, in TOML.
///
/// ```toml
/// evidence = "event-stream"
/// output_dir = "results"
///
/// [[scenario]]
/// name = "Health Check"
/// script = "scenarios/health-check.js"
/// description = "Probes the health endpoint"
/// ```
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioEntry>,
    #[serde(default)]
    pub evidence: Option<EvidenceMode>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioEntry {
    pub name: String,
    pub script: String,
    #[serde(default)]
    pub description: String,
}

impl From<ScenarioEntry> for ScenarioDescriptor {
    fn from(entry: ScenarioEntry) -> Self {
        ScenarioDescriptor::new(entry.name, entry.script, entry.description)
    }
}

impl SuiteFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse suite file {}", path.display()))
    }
}

/// Everything needed to run a suite, after combining the CLI with the suite file.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    pub scenarios: Vec<ScenarioDescriptor>,
    pub evidence: EvidenceMode,
    pub output_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl SuiteConfig {
    /// CLI options win over the suite file, which wins over the defaults.
    pub fn resolve(cli: &LoadSuiteCli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => SuiteFile::load(path)?,
            None => SuiteFile::default(),
        };

        let scenarios = if file.scenarios.is_empty() {
            if cli.config.is_some() {
                log::warn!("Suite file lists no scenarios, running the default catalogue");
            }
            default_catalogue()
        } else {
            file.scenarios.into_iter().map(Into::into).collect()
        };
        check_unique_scripts(&scenarios)?;

        Ok(Self {
            scenarios: select(scenarios, &cli.only)?,
            evidence: cli.evidence.or(file.evidence).unwrap_or_default(),
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            report_dir: cli
                .report_dir
                .clone()
                .or(file.report_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR)),
        })
    }
}

/// A script identifies its scenario, so it may only appear once in a suite.
fn check_unique_scripts(scenarios: &[ScenarioDescriptor]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.script_ref.as_str()) {
            bail!(
                "Script '{}' is used by more than one scenario",
                scenario.script_ref
            );
        }
    }
    Ok(())
}

/// Keep the scenarios whose script is in `only`, in suite order. An empty filter keeps everything.
fn select(
    scenarios: Vec<ScenarioDescriptor>,
    only: &[String],
) -> anyhow::Result<Vec<ScenarioDescriptor>> {
    if only.is_empty() {
        return Ok(scenarios);
    }

    for script in only {
        if !scenarios.iter().any(|s| &s.script_ref == script) {
            bail!("No scenario in the suite runs '{script}'");
        }
    }

    Ok(scenarios
        .into_iter()
        .filter(|s| only.contains(&s.script_ref))
        .collect())
}

/// The scenarios run when no suite file is given, in the order they run.
pub fn default_catalogue() -> Vec<ScenarioDescriptor> {
    [
        (
            "Health Check",
            "scenarios/health-check.js",
            "Baseline latency of the health endpoint under light load",
        ),
        (
            "Authentication",
            "scenarios/authentication.js",
            "Login and token refresh throughput",
        ),
        (
            "List Resources",
            "scenarios/list-resources.js",
            "Paginated listing of resources",
        ),
        (
            "Create Resource",
            "scenarios/create-resource.js",
            "Resource creation, including conflicts on existing resources",
        ),
        (
            "Read Resource",
            "scenarios/read-resource.js",
            "Fetching single resources by id",
        ),
        (
            "Update Resource",
            "scenarios/update-resource.js",
            "Partial and full updates of existing resources",
        ),
        (
            "Delete Resource",
            "scenarios/delete-resource.js",
            "Deleting resources, including ones that are already gone",
        ),
        (
            "Mixed Workload",
            "scenarios/mixed-workload.js",
            "Realistic mix of reads and writes",
        ),
        (
            "Spike",
            "scenarios/spike.js",
            "Sudden burst of virtual users and recovery",
        ),
        (
            "Soak",
            "scenarios/soak.js",
            "Sustained moderate load over a long period",
        ),
    ]
    .into_iter()
    .map(|(name, script, description)| ScenarioDescriptor::new(name, script, description))
    .collect()
}
