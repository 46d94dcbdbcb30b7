use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::process::Child;

/// Send `signal` to every process in group `pgid`.
fn signal_group(pgid: u32, signal: Signal) -> nix::Result<()> {
    killpg(Pid::from_raw(pgid as i32), signal)
}

/// Force-terminate a pipeline: SIGKILL the whole group, then kill and reap
/// each stage we hold a handle to.
pub(crate) async fn kill_pipeline(pgid: Option<u32>, children: &mut [Child]) {
    if let Some(pgid) = pgid {
        // ESRCH just means the group is already gone
        let _ = signal_group(pgid, Signal::SIGKILL);
    }
    for child in children.iter_mut() {
        let _ = child.kill().await;
    }
}
