use std::io;

use thiserror::Error;

use mproc_exec::ExecError;
use mproc_model::ModelError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Input(#[from] ModelError),

    #[error("invalid command: {0}")]
    Command(#[source] ExecError),

    #[error("exec setup failed: {0}")]
    Exec(#[from] ExecError),

    #[error("cannot prepare {path}: {source}")]
    Setup {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("run registry {path}: {source}")]
    Registry {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("journal failed: {0}")]
    Journal(String),

    #[error("signal handler: {0}")]
    Signal(#[source] io::Error),
}

impl CoreError {
    /// Input errors are reported before anything is launched.
    pub fn is_input(&self) -> bool {
        matches!(self, CoreError::Input(_) | CoreError::Command(_))
    }
}
