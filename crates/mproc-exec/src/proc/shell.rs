use std::{fs::File, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use mproc_model::{ExecMode, JobResult};

use crate::{
    error::ExecError,
    proc::{Pipeline, execute},
    runner::{Job, Runner},
};

const SHELL: &str = "sh";

/// ShellRunner: hands the whole command string to `sh -c`.
///
/// Redirects, globs and pipes all work, at the cost of shell injection:
/// trusted input only.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for ShellRunner {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn supports(&self, mode: ExecMode) -> bool {
        matches!(mode, ExecMode::Shell)
    }

    fn check(&self, command: &str) -> Result<(), ExecError> {
        if command.trim().is_empty() {
            return Err(ExecError::EmptyStage { stage: 0 });
        }
        Ok(())
    }

    async fn run(&self, job: Job) -> JobResult {
        execute(job, ExecMode::Shell, spawn_shell).await
    }
}

fn spawn_shell(script: &str, out: &File) -> Result<Pipeline, ExecError> {
    let mut cmd = Command::new(SHELL);
    cmd.arg("-c")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::from(out.try_clone()?))
        .stderr(Stdio::from(out.try_clone()?))
        .process_group(0)
        .kill_on_drop(true);

    trace!(target: "mproc.exec.shell", %script, "spawn");
    let child = cmd.spawn().map_err(|e| ExecError::Spawn {
        program: SHELL.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Pipeline::single(child))
}
