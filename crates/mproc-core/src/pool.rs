//! Bounded worker pool: at most `limit` variants are live at any moment.

use std::{path::Path, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use mproc_exec::{EventSink, Job, Runner};
use mproc_model::{JobOutcome, JobResult, Variant};

use crate::journal::Journal;

/// Tally of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Variants dispatched plus variants skipped.
    pub total: usize,
    pub succeeded: usize,
    /// Non-zero exit, foreign signal, or launch failure.
    pub failed: usize,
    /// Force-terminated on cancellation.
    pub killed: usize,
    /// Never dispatched because the run was cancelled first.
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &JobOutcome) {
        self.total += 1;
        match outcome {
            o if o.is_success() => self.succeeded += 1,
            JobOutcome::Killed => self.killed += 1,
            _ => self.failed += 1,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Dispatches variants to a [`Runner`] under a concurrency bound.
pub struct Scheduler {
    limit: usize,
    runner: Arc<dyn Runner>,
    journal: Journal,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        limit: usize,
        runner: Arc<dyn Runner>,
        journal: Journal,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            limit: limit.max(1),
            runner,
            journal,
            cancel,
        }
    }

    /// Run every variant to a terminal outcome and return the tally.
    ///
    /// Once the token is cancelled nothing new is dispatched; in-flight jobs
    /// observe the same token and are killed by their runner.
    pub async fn run<I>(&self, variants: I, out_dir: &Path) -> RunSummary
    where
        I: IntoIterator<Item = Variant>,
    {
        let permits = Arc::new(Semaphore::new(self.limit));
        let sink: Arc<dyn EventSink> = Arc::new(self.journal.clone());
        let mut pending = variants.into_iter().peekable();
        let mut inflight: JoinSet<JobResult> = JoinSet::new();
        let mut summary = RunSummary::default();

        loop {
            let dispatching = !self.cancel.is_cancelled() && pending.peek().is_some();
            if !dispatching && inflight.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                Some(joined) = inflight.join_next() => match joined {
                    Ok(res) => self.on_complete(res, &mut summary),
                    Err(e) => {
                        error!(target: "mproc.core.pool", error = %e, "worker task failed");
                        self.journal.emit(format!("<worker> Failed: {e}."));
                        summary.record(&JobOutcome::Errored { reason: e.to_string() });
                    }
                },

                _ = self.cancel.cancelled(), if dispatching => {
                    debug!(target: "mproc.core.pool", inflight = inflight.len(), "dispatch stopped");
                }

                permit = Arc::clone(&permits).acquire_owned(), if dispatching => {
                    let Ok(permit) = permit else { break };
                    let Some(variant) = pending.next() else { continue };
                    trace!(target: "mproc.core.pool", output = %variant.output_name, "dispatch");

                    let job = Job {
                        output: out_dir.join(&variant.output_name),
                        variant,
                        cancel: self.cancel.clone(),
                        events: Arc::clone(&sink),
                    };
                    let runner = Arc::clone(&self.runner);
                    inflight.spawn(async move {
                        // held until the runner has reaped every stage
                        let _permit = permit;
                        runner.run(job).await
                    });
                }

                else => break,
            }
        }
        permits.close();

        summary.skipped = pending.count();
        if summary.skipped > 0 {
            summary.total += summary.skipped;
            self.journal
                .emit(format!("Skipped {} undispatched jobs.", summary.skipped));
        }
        summary
    }

    fn on_complete(&self, res: JobResult, summary: &mut RunSummary) {
        let handle = res.handle();
        if res.pid.is_some() {
            self.journal.emit(format!(
                "{handle} Execution time: {:.3} seconds.",
                res.elapsed.as_secs_f64()
            ));
        }
        self.journal.emit(format!("{handle} {}", res.outcome));
        summary.record(&res.outcome);
    }
}
