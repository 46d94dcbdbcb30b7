use std::process::ExitCode;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mproc_core::{Orchestrator, OrchestratorConfig, RunRequest};
use mproc_model::{CommandTemplate, ExecMode};

use crate::cli::RunArgs;

/// `mproc run`: prints the journal path, then blocks until every variant is
/// done or the run is cancelled by a signal.
pub async fn run(cfg: OrchestratorConfig, args: RunArgs) -> anyhow::Result<ExitCode> {
    let mode = if args.shell {
        ExecMode::Shell
    } else {
        ExecMode::Direct
    };
    let cfg = cfg.with_concurrency(args.jobs).with_mode(mode);
    let orchestrator = Orchestrator::new(cfg);

    let request = RunRequest::new(CommandTemplate::new(args.command), args.modifiers)
        .with_input(invocation());
    let prepared = orchestrator.prepare(request)?;

    println!("{}", prepared.context().log_path().display());
    info!(
        dir = %prepared.context().out_dir.display(),
        total = prepared.total(),
        workers = prepared.context().concurrency,
        "run starting"
    );

    let report = prepared
        .execute(CancellationToken::new())
        .await
        .context("run aborted")?;

    let s = report.summary;
    info!(
        succeeded = s.succeeded,
        failed = s.failed,
        killed = s.killed,
        skipped = s.skipped,
        "run complete"
    );
    Ok(ExitCode::SUCCESS)
}

/// The command line as typed, re-quoted.
fn invocation() -> String {
    let argv: Vec<String> = std::env::args().collect();
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}
