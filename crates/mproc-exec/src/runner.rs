use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use mproc_model::{ExecMode, JobResult, Variant};

use crate::error::ExecError;

/// Destination for already-formatted lifecycle messages.
///
/// Implemented by the run journal; many workers hold one sink concurrently.
pub trait EventSink: Send + Sync {
    fn emit(&self, message: String);
}

/// Everything a runner needs to execute one variant.
#[derive(Clone)]
pub struct Job {
    pub variant: Variant,
    /// Full path of the variant's output file. Created and truncated by the runner.
    pub output: PathBuf,
    /// Shared run-wide stop signal.
    pub cancel: CancellationToken,
    pub events: Arc<dyn EventSink>,
}

/// Runner executes one [`Job`] in a given [`ExecMode`].
///
/// `run` never fails: every per-variant condition ends up in the returned
/// [`JobResult`], so a bad variant cannot take the scheduler down.
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn supports(&self, mode: ExecMode) -> bool;

    /// Validate a command string without spawning anything.
    fn check(&self, command: &str) -> Result<(), ExecError>;

    async fn run(&self, job: Job) -> JobResult;
}
