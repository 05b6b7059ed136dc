mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dao_treasury::{Address, Request, Settings};

const DEFAULT_CONFIG_PATH: &str = "dao.toml";

#[derive(Parser)]
#[command(name = "dao-treasury")]
#[command(author = "AEGIS Team")]
#[command(version)]
#[command(about = "Pooled-capital DAO treasury: contribute, propose, vote, execute", long_about = None)]
struct Cli {
    /// Settings file (TOML); built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger state file; overrides storage.state_path
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new DAO with the given admin
    Init {
        #[arg(long)]
        admin: String,

        /// Replace an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Contribute value in exchange for shares
    Contribute {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        amount: u64,
    },

    /// Redeem shares for the same amount of value
    Redeem {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        amount: u64,
    },

    /// Transfer shares to another address
    TransferShare {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        to: String,
    },

    /// Create a spending proposal
    Propose {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        recipient: String,
    },

    /// Vote for a proposal with all current shares
    Vote {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        proposal: u64,
    },

    /// Execute a proposal that passed (admin only)
    Execute {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        proposal: u64,
    },

    /// Withdraw unreserved funds (admin only)
    Withdraw {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        to: String,
    },

    /// Show treasury, shares and proposals
    Status,

    /// Show one proposal
    Proposal {
        #[arg(long)]
        id: u64,
    },

    /// Replay a JSON script of operations against a fresh DAO
    Replay {
        #[arg(long)]
        script: PathBuf,

        /// Write the resulting state to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Stop at the first rejected operation
        #[arg(long)]
        strict: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective configuration
    Show,

    /// Write a default configuration file
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.validate()?;
    Ok(settings)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn mutation(command: &Commands) -> Option<Request> {
    let request = match command {
        Commands::Contribute { caller, amount } => Request::Contribute {
            caller: Address::from(caller.as_str()),
            amount: *amount,
        },
        Commands::Redeem { caller, amount } => Request::RedeemShare {
            caller: Address::from(caller.as_str()),
            amount: *amount,
        },
        Commands::TransferShare { caller, amount, to } => Request::TransferShare {
            caller: Address::from(caller.as_str()),
            amount: *amount,
            to: Address::from(to.as_str()),
        },
        Commands::Propose {
            caller,
            name,
            amount,
            recipient,
        } => Request::CreateProposal {
            caller: Address::from(caller.as_str()),
            name: name.clone(),
            amount: *amount,
            recipient: Address::from(recipient.as_str()),
        },
        Commands::Vote { caller, proposal } => Request::Vote {
            caller: Address::from(caller.as_str()),
            proposal_id: *proposal,
        },
        Commands::Execute { caller, proposal } => Request::ExecuteProposal {
            caller: Address::from(caller.as_str()),
            proposal_id: *proposal,
        },
        Commands::Withdraw { caller, amount, to } => Request::WithdrawEther {
            caller: Address::from(caller.as_str()),
            amount: *amount,
            to: Address::from(to.as_str()),
        },
        _ => return None,
    };
    Some(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Writing a config must work before one exists
    if let Commands::Config {
        action: ConfigCommands::Init { force },
    } = &cli.command
    {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        return commands::config::init(&path, *force);
    }

    let settings = load_settings(cli.config.as_deref())?;
    init_logging(&settings.logging.level);

    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| settings.storage.state_path.clone());
    debug!("Using state file {}", state_path.display());

    if let Some(request) = mutation(&cli.command) {
        return commands::operate::execute(&state_path, request).await;
    }

    match cli.command {
        Commands::Init { admin, force } => {
            commands::init::execute(&settings, &state_path, admin, force).await?;
        }
        Commands::Status => {
            commands::status::execute(&state_path).await?;
        }
        Commands::Proposal { id } => {
            commands::status::proposal(&state_path, id).await?;
        }
        Commands::Replay {
            script,
            output,
            strict,
        } => {
            commands::replay::execute(&settings.dao, &script, output, strict).await?;
        }
        Commands::Config { action } => match action {
            ConfigCommands::Show => commands::config::show(&settings, cli.config.as_deref())?,
            ConfigCommands::Init { .. } => {}
        },
        _ => {}
    }

    Ok(())
}
