use std::sync::Arc;

use tracing::trace;

use mproc_model::ExecMode;

use crate::{DirectRunner, ShellRunner, error::ExecError, runner::Runner};

#[derive(Default)]
pub struct RunnerRouter {
    runners: Vec<Arc<dyn Runner>>,
}

impl RunnerRouter {
    #[inline]
    pub fn new() -> Self {
        Self {
            runners: Vec::new(),
        }
    }

    /// Router with the direct and shell runners registered.
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router.register(Arc::new(DirectRunner::new()));
        router.register(Arc::new(ShellRunner::new()));
        router
    }

    #[inline]
    pub fn register(&mut self, runner: Arc<dyn Runner>) {
        self.runners.push(runner);
    }

    /// First registered runner supporting `mode`.
    pub fn pick(&self, mode: ExecMode) -> Result<Arc<dyn Runner>, ExecError> {
        let r = self
            .runners
            .iter()
            .find(|r| r.supports(mode))
            .ok_or(ExecError::UnsupportedMode(mode.kind()))?;
        trace!(runner = r.name(), mode = mode.kind(), "runner picked");
        Ok(Arc::clone(r))
    }
}
