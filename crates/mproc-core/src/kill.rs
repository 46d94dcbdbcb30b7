use nix::{
    errno::Errno,
    sys::signal::{Signal, kill},
    unistd::Pid,
};
use tracing::{debug, warn};

use crate::{error::CoreError, registry::RunRegistry};

/// What a registry-wide kill did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KillReport {
    /// Pids the signal was delivered to.
    pub signalled: Vec<u32>,
    /// Pids with no live process; pruned from the registry.
    pub stale: Vec<u32>,
    /// Pids that exist but could not be signalled.
    pub refused: Vec<(u32, Errno)>,
}

/// Signal every registered orchestrator except the calling process.
///
/// Each orchestrator reacts by cancelling its own run and removes itself
/// from the registry on exit. Entries whose process is gone are pruned here.
pub fn kill_registered(registry: &RunRegistry, signal: Signal) -> Result<KillReport, CoreError> {
    let me = std::process::id();
    let mut report = KillReport::default();

    for pid in registry.entries()? {
        if pid == me {
            continue;
        }
        match kill(Pid::from_raw(pid as i32), signal) {
            Ok(()) => {
                debug!(target: "mproc.core.kill", pid, %signal, "signalled");
                report.signalled.push(pid);
            }
            Err(Errno::ESRCH) => report.stale.push(pid),
            Err(e) => {
                warn!(target: "mproc.core.kill", pid, error = %e, "cannot signal orchestrator");
                report.refused.push((pid, e));
            }
        }
    }

    if !report.stale.is_empty() {
        debug!(target: "mproc.core.kill", stale = ?report.stale, "pruning stale entries");
        let stale = report.stale.clone();
        registry.retain(|p| !stale.contains(p))?;
    }
    Ok(report)
}
