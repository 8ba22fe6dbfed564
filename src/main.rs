use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use marketkit::AppCommand;
use marketkit::core::TimePeriod;
use marketkit::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Refresh the local coin catalog from the provider
    Sync,
    /// Show the stamps of the last applied catalog sync
    SyncInfo,
    /// Search coins by name or code
    Coins {
        /// Case-insensitive name or code fragment
        #[arg(default_value = "")]
        filter: String,
        /// Maximum number of coins to list
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Display global market data for a period (1d, 1w, 2w, 1m, 3m, 6m, 1y, 2y)
    GlobalMarket { period: TimePeriod },
    /// Display a coin price at a unix timestamp
    HistoricalPrice { coin_uid: String, timestamp: i64 },
    /// Display live spot prices
    Prices {
        #[arg(required = true)]
        coin_uids: Vec<String>,
        /// Number of price updates to wait for
        #[arg(short, long, default_value_t = 1)]
        updates: usize,
    },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Sync => AppCommand::Sync,
            Commands::SyncInfo => AppCommand::SyncInfo,
            Commands::Coins { filter, limit } => AppCommand::Coins { filter, limit },
            Commands::GlobalMarket { period } => AppCommand::GlobalMarket { period },
            Commands::HistoricalPrice {
                coin_uid,
                timestamp,
            } => AppCommand::HistoricalPrice {
                coin_uid,
                timestamp,
            },
            Commands::Prices { coin_uids, updates } => AppCommand::Prices { coin_uids, updates },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => marketkit::cli::setup::setup_at_path(path),
            None => marketkit::cli::setup::setup(),
        },
        Some(cmd) => marketkit::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
