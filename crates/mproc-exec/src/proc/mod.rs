use std::{
    fs::File,
    io,
    os::unix::process::ExitStatusExt,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Instant,
};

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, trace, warn};

use mproc_model::{ExecMode, JobOutcome, JobResult};

use crate::{
    error::ExecError,
    runner::{Job, Runner},
    stages::split_stages,
    util::kill_pipeline,
};

mod shell;
pub use shell::ShellRunner;

/// Spawned processes of one variant, first stage to last.
///
/// All stages share one process group whose id is the first stage's pid.
pub(crate) struct Pipeline {
    children: Vec<Child>,
    pgid: Option<u32>,
}

impl Pipeline {
    pub(crate) fn single(child: Child) -> Self {
        let pgid = child.id();
        Self {
            children: vec![child],
            pgid,
        }
    }

    fn leaf_pid(&self) -> Option<u32> {
        self.children.last().and_then(|c| c.id())
    }

    /// Wait for every stage; the pipeline's status is the last stage's.
    async fn wait(&mut self) -> io::Result<ExitStatus> {
        let (leaf, upstream) = self
            .children
            .split_last_mut()
            .ok_or_else(|| io::Error::other("empty pipeline"))?;
        let status = leaf.wait().await?;
        for child in upstream.iter_mut() {
            child.wait().await?;
        }
        Ok(status)
    }

    async fn kill(&mut self) {
        kill_pipeline(self.pgid, &mut self.children).await;
    }
}

/// Runner for [`ExecMode::Direct`]: `a | b | c` chained without a shell.
///
/// Stage *i*'s stdout feeds stage *i+1*'s stdin; the last stage's stdout and
/// every stage's stderr go to the output file.
#[derive(Debug, Default)]
pub struct DirectRunner;

impl DirectRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for DirectRunner {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn supports(&self, mode: ExecMode) -> bool {
        matches!(mode, ExecMode::Direct)
    }

    fn check(&self, command: &str) -> Result<(), ExecError> {
        split_stages(command).map(|_| ())
    }

    async fn run(&self, job: Job) -> JobResult {
        execute(job, ExecMode::Direct, |command, out| {
            let stages = split_stages(command)?;
            spawn_stages(&stages, out)
        })
        .await
    }
}

fn spawn_stages(stages: &[Vec<String>], out: &File) -> Result<Pipeline, ExecError> {
    let mut children: Vec<Child> = Vec::with_capacity(stages.len());
    let mut pgid: Option<u32> = None;
    let mut upstream: Option<Stdio> = None;

    for (i, argv) in stages.iter().enumerate() {
        let last = i + 1 == stages.len();
        let (program, args) = argv
            .split_first()
            .ok_or(ExecError::EmptyStage { stage: i })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(upstream.take().unwrap_or_else(Stdio::null))
            .stderr(Stdio::from(out.try_clone()?))
            .process_group(pgid.map_or(0, |p| p as i32))
            .kill_on_drop(true);
        if last {
            cmd.stdout(Stdio::from(out.try_clone()?));
        } else {
            cmd.stdout(Stdio::piped());
        }

        trace!(target: "mproc.exec.direct", stage = i, %program, ?args, "spawn");
        // already-spawned stages are killed on drop if this one fails
        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        if pgid.is_none() {
            pgid = child.id();
        }
        if !last {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| io::Error::other("stage stdout not piped"))?;
            let next: Stdio = stdout.try_into()?;
            upstream = Some(next);
        }
        children.push(child);
    }

    Ok(Pipeline { children, pgid })
}

/// Shared worker lifecycle: create the output file, launch, then wait for
/// natural exit or the run's cancellation, whichever comes first.
pub(crate) async fn execute<F>(job: Job, mode: ExecMode, spawn: F) -> JobResult
where
    F: FnOnce(&str, &File) -> Result<Pipeline, ExecError>,
{
    let name = job.variant.output_name.clone();

    let out = match open_output(&job.output) {
        Ok(f) => f,
        Err(e) => {
            warn!(target: "mproc.exec", output = %job.output.display(), error = %e, "output file");
            return JobResult::errored(name, e.to_string());
        }
    };

    let started = Instant::now();
    let mut pipeline = match spawn(&job.variant.command, &out) {
        Ok(p) => p,
        Err(e) => {
            debug!(target: "mproc.exec", command = %job.variant.command, error = %e, "launch failed");
            return JobResult::errored(name, e.to_string());
        }
    };
    // children hold their own descriptors from here on
    drop(out);

    let pid = pipeline.leaf_pid();
    let handle = match pid {
        Some(pid) => format!("<pid:{pid}>"),
        None => format!("<{name}>"),
    };
    let launched = match mode {
        ExecMode::Direct => format!("{handle} Executing command: \"{}\"", job.variant.command),
        ExecMode::Shell => format!(
            "{handle} Executing command (shell mode): \"{}\"",
            job.variant.command
        ),
    };
    job.events.emit(launched);

    let outcome = tokio::select! {
        status = pipeline.wait() => match status {
            Ok(status) => outcome_of(status),
            Err(e) => JobOutcome::Errored { reason: format!("wait: {e}") },
        },
        _ = job.cancel.cancelled() => {
            debug!(target: "mproc.exec", ?pid, "cancelled; killing pipeline");
            job.events.emit(format!("{handle} Cleaning up."));
            pipeline.kill().await;
            JobOutcome::Killed
        }
    };

    JobResult {
        pid,
        output_name: name,
        outcome,
        elapsed: started.elapsed(),
    }
}

fn open_output(path: &Path) -> Result<File, ExecError> {
    File::create(path).map_err(|e| ExecError::OutputFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn outcome_of(status: ExitStatus) -> JobOutcome {
    match status.code() {
        Some(code) => JobOutcome::Exited { code },
        None => JobOutcome::Signaled {
            signal: status.signal().unwrap_or_default(),
        },
    }
}
