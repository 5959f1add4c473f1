//! Strongbox CLI - timelocked custody accounts in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, logs, recover, status, transfers, withdraw};

/// Strongbox - timelocked custody accounts
#[derive(Parser)]
#[command(name = "sbx", version, about, long_about = None)]
struct Cli {
    /// Identity to act as
    #[arg(long = "as", global = true, env = "STRONGBOX_IDENTITY")]
    identity: Option<String>,

    /// Print diagnostics (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an account for the caller with a fixed backup address
    Create {
        /// Recovery destination, cannot be changed later
        backup: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposit into the caller's account
    Deposit {
        /// Amount in display units, e.g. 0.5
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Freeze the caller's account (cannot be undone)
    Freeze {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Timelocked withdrawals
    Withdraw {
        #[command(subcommand)]
        command: withdraw::WithdrawCommands,
    },

    /// Withdraw from a frozen account to its backup address
    Recover {
        /// Amount in display units
        amount: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show account details
    Show {
        /// Account owner (defaults to the caller)
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the pending withdrawal slot
    Withdrawal {
        /// Account owner (defaults to the caller)
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List executed payouts
    Transfers {
        /// Account owner (defaults to the caller)
        owner: Option<String>,
        /// List payouts from every account
        #[arg(long, conflicts_with = "owner")]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show custody summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "strongbox_core=debug,sbx=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let identity = cli.identity.as_deref();
    match cli.command {
        Commands::Create { backup, json } => account::create(identity, &backup, json),
        Commands::Deposit { amount, json } => account::deposit(identity, &amount, json),
        Commands::Freeze { force, json } => account::freeze(identity, force, json),
        Commands::Withdraw { command } => withdraw::run(identity, command),
        Commands::Recover { amount, force, json } => recover::run(identity, &amount, force, json),
        Commands::Show { owner, json } => account::show(identity, owner.as_deref(), json),
        Commands::Withdrawal { owner, json } => {
            withdraw::show(identity, owner.as_deref(), json)
        }
        Commands::Transfers { owner, all, json } => {
            transfers::run(identity, owner.as_deref(), all, json)
        }
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
