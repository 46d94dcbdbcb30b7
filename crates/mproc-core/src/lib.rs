//! Job orchestration: fan a command template out into variants, run them
//! under a bounded pool, journal every lifecycle event, and tear everything
//! down on cancellation.
pub mod error;
pub use error::CoreError;

pub mod config;
pub use config::{OrchestratorConfig, resolve_concurrency};

pub mod variants;
pub use variants::{VariantSet, Variants};

pub mod context;
pub use context::RunContext;

pub mod journal;
pub use journal::{Journal, JournalWriter, LogEvent};

pub mod registry;
pub use registry::RunRegistry;

pub mod pool;
pub use pool::{RunSummary, Scheduler};

pub mod cancel;
pub use cancel::{CancellationController, ControllerState};

pub mod orchestrator;
pub use orchestrator::{Orchestrator, PreparedRun, RunReport, RunRequest};

pub mod kill;
pub use kill::{KillReport, kill_registered};
