use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mproc_core::config::DEFAULT_OUTPUT_ROOT;
use mproc_model::ModifierRange;
use mproc_observe::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "mproc",
    version,
    about = "Run a command template once per combination of integer modifiers, in parallel",
    after_help = "Placeholders %0..%9 in the command take the values of the 1st..10th modifier range.\n\
                  Ranges: N (1..N), A:B (A..B) or A:B:STEP, all inclusive.\n\
                  A range starting with a minus sign must be attached: --modifiers=-3:3"
)]
pub struct Cli {
    /// Directory holding run outputs and the registry of running orchestrators
    #[arg(long, global = true, env = "MPROC_OUT_DIR", default_value = DEFAULT_OUTPUT_ROOT)]
    pub out_dir: PathBuf,

    /// Diagnostic log filter on stderr, e.g. `info` or `mproc.core.pool=trace`
    #[arg(long, global = true, env = "MPROC_LOG", default_value = "warn")]
    pub log_level: String,

    /// Diagnostic log format: text or json
    #[arg(long, global = true, env = "MPROC_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch every variant of a command template
    Run(RunArgs),

    /// Stop every running orchestrator listed in the registry
    Kill,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command template, e.g. "convert in_%0.png -resize %1% out_%0_%1.png"
    pub command: String,

    /// Modifier ranges, one per placeholder slot
    #[arg(short = 'm', long = "modifiers", value_name = "RANGE", num_args = 1..)]
    pub modifiers: Vec<ModifierRange>,

    /// Worker pool size; 0 uses one worker per core
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = 0)]
    pub jobs: usize,

    /// Run each variant through `sh -c` (pipes, redirects, globs). Trusted input only
    #[arg(short = 's', long)]
    pub shell: bool,
}
