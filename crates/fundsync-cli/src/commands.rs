use anyhow::Result;
use chrono::{Local, Utc};
use fundsync_cli::config::AppConfig;
use fundsync_cli::pipeline::{run_contacts, run_fundraising, run_tickets, run_transactions};

use crate::cli::{Cli, Command};
use crate::summary::{print_contacts, print_fundraising, print_tickets, print_transactions};

fn exit_code(success: bool) -> i32 {
    if success { 0 } else { 1 }
}

/// Loads `.env`, then the configuration with CLI overrides applied.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(error) if error.not_found() => {}
        Err(error) => tracing::warn!(%error, "ignoring unreadable .env"),
    }
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(dir) = &cli.work_dir {
        config.work_dir = dir.clone();
    }
    Ok(config)
}

/// Runs the selected command and prints its summary. Returns the exit code.
pub fn run_command(cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;
    match cli.command {
        Command::Tickets => {
            let outcome = run_tickets(&config, Local::now())?;
            print_tickets(&outcome);
            Ok(exit_code(outcome.is_success()))
        }
        Command::Transactions => {
            let outcome = run_transactions(&config, Utc::now())?;
            print_transactions(&outcome);
            Ok(0)
        }
        Command::Fundraising => {
            let outcome = run_fundraising(&config, Local::now())?;
            print_fundraising(&outcome);
            Ok(exit_code(outcome.is_success()))
        }
        Command::Contacts => {
            let outcome = run_contacts(&config)?;
            print_contacts(&outcome);
            Ok(exit_code(outcome.is_success()))
        }
        Command::CheckConfig => {
            println!("# {}", cli.config.display());
            print!("{}", config.to_toml()?);
            Ok(0)
        }
    }
}
