use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("unsupported exec mode for this runner: {0}")]
    UnsupportedMode(&'static str),
    #[error("unbalanced quotes in stage {stage}: {text}")]
    UnbalancedQuotes { stage: usize, text: String },
    #[error("empty pipeline stage {stage}")]
    EmptyStage { stage: usize },
    #[error("cannot create output file {path}: {reason}")]
    OutputFile { path: String, reason: String },
    #[error("spawn '{program}' failed: {reason}")]
    Spawn { program: String, reason: String },
    #[error("io error: {0}")]
    Io(String),
}

impl ExecError {
    /// Syntax errors are input errors: they can be found without spawning anything.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ExecError::UnbalancedQuotes { .. } | ExecError::EmptyStage { .. }
        )
    }
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}
