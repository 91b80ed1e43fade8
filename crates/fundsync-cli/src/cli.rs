//! CLI argument definitions.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use fundsync_cli::config::DEFAULT_CONFIG_FILE;
use fundsync_cli::logging::{LogConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "fundsync",
    version,
    about = "Fundraising exports to reports, and roster contacts to Google Contacts",
    long_about = "Turns fundraising platform exports and API data into spreadsheet reports,\n\
                  tracks changes between runs, and keeps Google Contacts groups in step\n\
                  with event rosters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (missing file means defaults).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Override `work_dir` from the configuration.
    #[arg(long = "work-dir", value_name = "DIR", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include contact names and emails in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split the latest ticket export into a workbook, export and sync contacts.
    Tickets,

    /// Snapshot transaction cohorts, write change files and the master workbook.
    Transactions,

    /// Build campaign progress and ticket reports from the fundraising API.
    Fundraising,

    /// Sync an existing contact export to every configured account.
    Contacts,

    /// Print the resolved configuration.
    CheckConfig,
}

impl Cli {
    /// Logging setup implied by the flags.
    ///
    /// `--log-level` beats `-v`/`-q`; either one disables the `RUST_LOG`
    /// override. ANSI colour is off when logging to a file or a pipe unless
    /// `--color always` is given.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level_filter: self
                .log_level
                .map_or_else(|| self.verbosity.tracing_level_filter(), LevelFilter::from),
            use_env_filter: !(self.verbosity.is_present() || self.log_level.is_some()),
            with_ansi: match self.color.color {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
            },
            format: self.log_format.into(),
            log_file: self.log_file.clone(),
            log_data: self.log_data,
            ..LogConfig::default()
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
