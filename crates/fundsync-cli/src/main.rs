//! fundsync CLI.

use std::process::ExitCode;

use clap::Parser;
use fundsync_cli::logging::init_logging;

mod cli;
mod commands;
mod summary;

use crate::cli::Cli;
use crate::commands::run_command;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match run_command(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "run failed");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
