use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use mproc_core::{CoreError, OrchestratorConfig};
use mproc_observe::LogSettings;

mod cli;
mod commands;

use cli::{Cli, Command};

/// Bad input: nothing was launched.
const EXIT_INPUT: u8 = 2;
/// Environment or setup failure.
const EXIT_SETUP: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // before the runtime spawns threads, so the local offset is readable
    let cfg = OrchestratorConfig::new(&cli.out_dir);

    let log = LogSettings::new(cfg.utc_offset)
        .with_filter(cli.log_level.as_str())
        .with_format(cli.log_format);
    if let Err(e) = mproc_observe::init(&log) {
        eprintln!("mproc: {e}");
        return ExitCode::from(EXIT_INPUT);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("mproc: cannot start runtime: {e}");
            return ExitCode::from(EXIT_SETUP);
        }
    };

    let result = runtime.block_on(async move {
        match cli.command {
            Command::Run(args) => commands::run::run(cfg, args).await,
            Command::Kill => commands::kill::kill(&cfg),
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("mproc: {e:#}");
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(e: &anyhow::Error) -> ExitCode {
    let input = e
        .downcast_ref::<CoreError>()
        .is_some_and(CoreError::is_input);
    debug!(input, "mapping error to exit status");
    if input {
        ExitCode::from(EXIT_INPUT)
    } else {
        ExitCode::from(EXIT_SETUP)
    }
}
