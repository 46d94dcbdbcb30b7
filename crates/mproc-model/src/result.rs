use std::{fmt, time::Duration};

/// Terminal state of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Process exited on its own with an exit code.
    Exited { code: i32 },
    /// Process ended on its own but was terminated by a signal from elsewhere.
    Signaled { signal: i32 },
    /// Force-terminated after the run was cancelled.
    Killed,
    /// Never launched: bad command syntax, output file, or spawn failure.
    Errored { reason: String },
}

impl JobOutcome {
    /// Returns `true` only for a natural exit with status 0.
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Exited { code: 0 })
    }

    /// Returns `true` if the job was stopped by cancellation.
    pub fn is_killed(&self) -> bool {
        matches!(self, JobOutcome::Killed)
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Exited { code: 0 } => f.write_str("Completed successfully."),
            JobOutcome::Exited { code } => write!(f, "Failed with exit status {code}."),
            JobOutcome::Signaled { signal } => write!(f, "Failed: terminated by signal {signal}."),
            JobOutcome::Killed => f.write_str("Manually killed."),
            JobOutcome::Errored { reason } => write!(f, "Failed to launch: {reason}."),
        }
    }
}

/// Outcome of one variant's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Identifier of the last pipeline stage, if anything was spawned.
    pub pid: Option<u32>,
    /// Output file name of the variant.
    pub output_name: String,
    pub outcome: JobOutcome,
    /// Wall-clock time from launch to observed termination.
    pub elapsed: Duration,
}

impl JobResult {
    pub fn errored(output_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pid: None,
            output_name: output_name.into(),
            outcome: JobOutcome::Errored {
                reason: reason.into(),
            },
            elapsed: Duration::ZERO,
        }
    }

    /// Prefix used for this job's journal lines: `<pid:N>` or `<name>`.
    pub fn handle(&self) -> String {
        match self.pid {
            Some(pid) => format!("<pid:{pid}>"),
            None => format!("<{}>", self.output_name),
        }
    }
}
