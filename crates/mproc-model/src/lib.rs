//! Plain data shared by the executor, the scheduler and the CLI.
//!
//! Nothing in this crate spawns processes or touches the filesystem.

mod error;
pub use error::ModelError;

mod range;
pub use range::ModifierRange;

mod template;
pub use template::{CommandTemplate, MAX_SLOTS};

mod variant;
pub use variant::{DEFAULT_OUTPUT_NAME, Variant, output_name_for};

mod mode;
pub use mode::ExecMode;

mod result;
pub use result::{JobOutcome, JobResult};
