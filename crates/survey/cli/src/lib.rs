//! surveyctl - operate a survey reward ledger from the command line
//!
//! Each invocation loads the ledger state file, applies at most one
//! operation and writes the state back. Nothing is saved when an
//! operation is rejected.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;
mod state;

use commands::LedgerCommands;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
pub use output::OutputFormat;

/// surveyctl application
#[derive(Parser)]
#[command(name = "surveyctl")]
#[command(about = "surveyctl - survey reward ledger CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "SURVEYCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger state file (JSON)
    #[arg(long, global = true, env = "SURVEYCTL_STATE")]
    state: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: LedgerCommands,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();

    let config = CliConfig::load(cli.config.as_deref())?;
    let state = state::StateFile::new(config.state_path(cli.state.as_deref()));

    commands::execute(cli.command, &config, &state, cli.output)
}
