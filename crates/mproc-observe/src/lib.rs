//! Diagnostic logging for the `mproc` tools.
//!
//! This is the developer-facing `tracing` output on stderr. The per-run
//! event log lives in `mproc-core`'s journal and is unrelated: nothing here
//! ever writes into an output directory.
mod error;
mod init;
mod settings;

pub use error::LogError;
pub use init::init;
pub use settings::{LogFormat, LogSettings};
