//! `defi-evm` entry point

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use defi_evm_cli::tracing::init_tracing;
use defi_evm_cli::{CliConfig, CliReporter, LoanCommand, NetworksCommand};
use defi_evm_loan::OutcomeCode;

//-----------------------------------------------------------------------------
// Command Definition
//-----------------------------------------------------------------------------

/// Collateralised loans against Compound-fork lending deployments
#[derive(Debug, Parser)]
#[command(name = "defi-evm", version, about)]
struct Cli {
    /// Enable verbose error output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter used when RUST_LOG is unset, e.g. "debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "DEFI_EVM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deposit collateral, mint receipt tokens and borrow
    Loan(LoanCommand),

    /// List the built-in lending deployments
    Networks(NetworksCommand),
}

//-----------------------------------------------------------------------------
// Main Function
//-----------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Values from .env feed clap's env lookups
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let json = match &cli.command {
        Command::Loan(command) => command.json,
        Command::Networks(command) => command.json,
    };
    let reporter = CliReporter::new(cli.verbose, json);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            reporter.handle_error(&err);
            OutcomeCode::InvalidInput.exit_code()
        }
    };
    process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = CliConfig::load_optional(cli.config.as_deref())?;

    let log_level = cli.log_level.as_deref().or(config.log_level.as_deref());
    let json_logs = cli.json_logs || config.json_logs.unwrap_or(false);
    init_tracing(log_level, json_logs)?;

    match cli.command {
        Command::Loan(command) => command.execute(&config, cli.verbose).await,
        Command::Networks(command) => command.execute(),
    }
}
