use std::{num::NonZeroUsize, path::PathBuf};

use time::UtcOffset;

use mproc_model::ExecMode;

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "mpout";
/// Registry file name inside the output root.
pub const REGISTRY_FILE: &str = "pids";

/// Settings for one orchestrated run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Parent of every run's output directory.
    pub output_root: PathBuf,
    /// Shared list of live orchestrator pids.
    pub registry_file: PathBuf,
    /// Requested pool size; `0` means one worker per available core.
    pub concurrency: usize,
    pub mode: ExecMode,
    /// Offset for journal timestamps.
    ///
    /// Resolved when the config is built: the local offset cannot be read
    /// reliably once the runtime has started its worker threads.
    pub utc_offset: UtcOffset,
    /// Install SIGINT/SIGTERM/SIGQUIT handlers for the duration of the run.
    pub handle_signals: bool,
}

impl OrchestratorConfig {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        let output_root = output_root.into();
        Self {
            registry_file: output_root.join(REGISTRY_FILE),
            output_root,
            concurrency: 0,
            mode: ExecMode::Direct,
            utc_offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            handle_signals: true,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_registry_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_file = path.into();
        self
    }

    pub fn with_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_ROOT)
    }
}

/// Effective pool size: the request (or the core count when unset), never
/// more than there are variants.
pub fn resolve_concurrency(requested: usize, total: usize) -> usize {
    let cap = if requested == 0 {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    } else {
        requested
    };
    cap.min(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_never_exceeds_variant_count() {
        assert_eq!(resolve_concurrency(8, 3), 3);
        assert_eq!(resolve_concurrency(2, 10), 2);
        assert_eq!(resolve_concurrency(4, 0), 0);
    }

    #[test]
    fn unset_concurrency_uses_cores() {
        let cores = std::thread::available_parallelism().unwrap().get();
        assert_eq!(resolve_concurrency(0, usize::MAX), cores);
        assert_eq!(resolve_concurrency(0, 1), 1);
    }

    #[test]
    fn registry_lives_under_root() {
        let cfg = OrchestratorConfig::new("/tmp/x");
        assert_eq!(cfg.registry_file, PathBuf::from("/tmp/x/pids"));
        assert_eq!(cfg.mode, ExecMode::Direct);
    }
}
