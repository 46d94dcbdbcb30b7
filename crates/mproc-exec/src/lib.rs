//! Pipeline executor: runs one variant to completion or forced termination.
//!
//! Two runners share one lifecycle:
//! - [`DirectRunner`] chains `a | b | c` stages without a shell;
//! - [`ShellRunner`] hands the string to `sh -c`.
//!
//! Every pipeline runs in its own process group, so cancellation can take
//! down every stage (and anything a shell forked) with one signal.

mod error;
pub use error::ExecError;

mod runner;
pub use runner::{EventSink, Job, Runner};

mod router;
pub use router::RunnerRouter;

pub mod stages;
pub use stages::split_stages;

mod util;

pub mod proc;
pub use proc::{DirectRunner, ShellRunner};
