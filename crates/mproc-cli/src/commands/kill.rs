use std::process::ExitCode;

use anyhow::Context;
use nix::sys::signal::Signal;

use mproc_core::{OrchestratorConfig, RunRegistry, kill_registered};

/// `mproc kill`: ask every registered orchestrator to cancel its run.
pub fn kill(cfg: &OrchestratorConfig) -> anyhow::Result<ExitCode> {
    let registry = RunRegistry::new(&cfg.registry_file);
    let report = kill_registered(&registry, Signal::SIGTERM)
        .with_context(|| format!("cannot read {}", registry.path().display()))?;

    if report.signalled.is_empty() {
        println!("No running orchestrators.");
    }
    for pid in &report.signalled {
        println!("Sent SIGTERM to orchestrator {pid}.");
    }
    for pid in &report.stale {
        println!("Removed stale entry {pid}.");
    }
    for (pid, e) in &report.refused {
        eprintln!("mproc: cannot signal orchestrator {pid}: {e}");
    }
    Ok(ExitCode::SUCCESS)
}
