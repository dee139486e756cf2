mod engine;
mod error;
mod executor;
mod progress;
mod session;

pub mod prelude {
    pub use crate::engine::{
        engine_path, CommandEngine, Engine, EngineOutput, EvidenceMode, Invocation,
        DEFAULT_ENGINE, ENGINE_PATH_ENV,
    };
    pub use crate::error::ScenarioExecutionError;
    pub use crate::executor::{EvidencePaths, RunExecutor};
    pub use crate::progress::SuiteProgress;
    pub use crate::session::{Session, SessionConfig};
}
