/// A scenario that could not be run to completion by the engine.
///
/// The suite records these on the scenario's result and moves on to the next scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioExecutionError {
    #[error("Failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Engine exited with {status}: {message}")]
    NonZeroExit {
        status: String,
        message: String,
        /// What the engine printed to stdout before failing
        console: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScenarioExecutionError {
    /// Console output captured before the failure, if any.
    pub fn console(&self) -> Option<&str> {
        match self {
            ScenarioExecutionError::NonZeroExit { console, .. } if !console.is_empty() => {
                Some(console)
            }
            _ => None,
        }
    }
}
