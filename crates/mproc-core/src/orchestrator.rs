use std::{path::PathBuf, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mproc_exec::{Runner, RunnerRouter};
use mproc_model::{CommandTemplate, ModifierRange};

use crate::{
    cancel::CancellationController,
    config::{OrchestratorConfig, resolve_concurrency},
    context::RunContext,
    error::CoreError,
    journal::Journal,
    pool::{RunSummary, Scheduler},
    registry::RunRegistry,
    variants::VariantSet,
};

/// What to run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub template: CommandTemplate,
    pub ranges: Vec<ModifierRange>,
    /// Invocation as typed, echoed at the top of the journal.
    pub input: String,
}

impl RunRequest {
    pub fn new(template: impl Into<CommandTemplate>, ranges: Vec<ModifierRange>) -> Self {
        let template = template.into();
        Self {
            input: template.as_str().to_string(),
            template,
            ranges,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }
}

/// Result of a run that reached finalization, cancelled or not.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ctx: RunContext,
    pub summary: RunSummary,
    pub cancelled: bool,
}

impl RunReport {
    pub fn log_path(&self) -> PathBuf {
        self.ctx.log_path()
    }
}

pub struct Orchestrator {
    cfg: OrchestratorConfig,
    router: RunnerRouter,
}

impl Orchestrator {
    pub fn new(cfg: OrchestratorConfig) -> Self {
        Self::with_router(cfg, RunnerRouter::with_defaults())
    }

    pub fn with_router(cfg: OrchestratorConfig, router: RunnerRouter) -> Self {
        Self { cfg, router }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.cfg
    }

    /// Validate the request and claim an output directory.
    ///
    /// Input errors surface here, before any directory or process exists.
    pub fn prepare(&self, req: RunRequest) -> Result<PreparedRun, CoreError> {
        let variants = VariantSet::new(req.template, req.ranges)?;
        let runner = self.router.pick(self.cfg.mode)?;
        runner
            .check(variants.template().as_str())
            .map_err(CoreError::Command)?;

        let concurrency = resolve_concurrency(self.cfg.concurrency, variants.len());
        let ctx = RunContext::create(&self.cfg, variants.template(), concurrency)?;
        Ok(PreparedRun {
            cfg: self.cfg.clone(),
            ctx,
            variants,
            runner,
            input: req.input,
        })
    }

    /// [`prepare`](Self::prepare) then [`execute`](PreparedRun::execute).
    pub async fn run(&self, req: RunRequest, stop: CancellationToken) -> Result<RunReport, CoreError> {
        self.prepare(req)?.execute(stop).await
    }
}

/// A validated run with its output directory in place.
pub struct PreparedRun {
    cfg: OrchestratorConfig,
    ctx: RunContext,
    variants: VariantSet,
    runner: Arc<dyn Runner>,
    input: String,
}

impl PreparedRun {
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn total(&self) -> usize {
        self.variants.len()
    }

    /// Run every variant until done or until `stop` (or a signal) cancels
    /// the run. The orchestrator is listed in the registry meanwhile.
    pub async fn execute(self, stop: CancellationToken) -> Result<RunReport, CoreError> {
        let pid = std::process::id();
        let registry = RunRegistry::new(&self.cfg.registry_file);
        registry.register(pid)?;

        let result = self.drive(pid, stop).await;

        match (registry.deregister(pid), &result) {
            (Err(e), Ok(_)) => return Err(e),
            (Err(e), Err(_)) => {
                warn!(target: "mproc.core", error = %e, "registry cleanup failed");
            }
            _ => {}
        }
        let (summary, cancelled) = result?;

        info!(
            target: "mproc.core",
            dir = %self.ctx.out_dir.display(),
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            killed = summary.killed,
            skipped = summary.skipped,
            cancelled,
            "run finished"
        );
        Ok(RunReport {
            ctx: self.ctx,
            summary,
            cancelled,
        })
    }

    async fn drive(&self, pid: u32, stop: CancellationToken) -> Result<(RunSummary, bool), CoreError> {
        let (journal, writer) = Journal::spawn(&self.ctx.log_path(), self.ctx.started_at)?;
        journal.emit(format!("Input: {}", self.input));
        journal.emit(format!("Output: {}", self.ctx.out_dir.display()));
        journal.emit(format!("Orchestrator pid: {pid}"));
        journal.emit(format!("Total of {} jobs.", self.variants.len()));
        journal.emit(format!(
            "Initialized worker pool of size {}.",
            self.ctx.concurrency
        ));

        let controller = CancellationController::new(journal.clone());
        let watcher = match controller.watch(stop, self.cfg.handle_signals) {
            Ok(w) => w,
            Err(e) => {
                writer.finalize().await?;
                return Err(e);
            }
        };

        let scheduler = Scheduler::new(
            self.ctx.concurrency,
            Arc::clone(&self.runner),
            journal,
            controller.token(),
        );
        let summary = scheduler.run(&self.variants, &self.ctx.out_dir).await;

        let cancelled = controller.is_cancelled();
        controller.finish();
        if let Err(e) = watcher.await {
            warn!(target: "mproc.core", error = %e, "signal watcher failed");
        }
        writer.finalize().await?;
        Ok((summary, cancelled))
    }
}
