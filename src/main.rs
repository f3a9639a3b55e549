use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use spot_pnl::analytics::{balance_report, export_csv, realized_report};
use spot_pnl::bybit::BybitClient;
use spot_pnl::cache::{SqliteTradeCache, TradeSync};
use spot_pnl::config::{ClientConfig, Credentials, FetchConfig};
use spot_pnl::history::HistoryFetcher;
use spot_pnl::portfolio::{load_analysis, load_balance_view};
use spot_pnl::ApiError;

#[derive(Parser, Debug)]
#[command(name = "spot-pnl")]
#[command(about = "Bybit spot trade-history sync and cost-basis PNL")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// SQLite file holding the per-user trade cache
    #[arg(long, global = true, env = "SPOT_PNL_DB", default_value = "trades_cache.db")]
    db: PathBuf,

    /// User whose history is cached
    #[arg(long, global = true, env = "SPOT_PNL_USER_ID", default_value = "0")]
    user_id: i64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring the cached execution history up to date
    Sync,

    /// Realized PNL per symbol
    Report,

    /// Current holdings with unrealized PNL
    Balance,

    /// Write the per-symbol accounting to a CSV file
    Export {
        /// Destination file
        #[arg(short, long, default_value = "spot_pnl.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spot_pnl=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let credentials = Credentials::from_env()?;
    let config = ClientConfig::from_env()?;
    info!("Using {} (recv window {}ms)", config.base_url, config.recv_window_ms);

    let client = BybitClient::new(config, credentials)?;
    let cache = SqliteTradeCache::open(&args.db)
        .with_context(|| format!("Failed to open trade cache at {}", args.db.display()))?;
    let sync = TradeSync::new(cache, HistoryFetcher::new(FetchConfig::default()));

    if let Err(err) = run(args.command, &client, &sync, args.user_id).await {
        if let Some(api) = err.downcast_ref::<ApiError>() {
            error!("Command failed: {}", api);
            eprintln!("{}", api.user_message());
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}

async fn run(
    command: Commands,
    client: &BybitClient,
    sync: &TradeSync<SqliteTradeCache>,
    user_id: i64,
) -> Result<()> {
    match command {
        Commands::Sync => {
            let executions = sync.get_trades_with_cache(client, user_id).await?;
            println!("{} executions cached for user {}", executions.len(), user_id);
        }
        Commands::Report => {
            let analysis = load_analysis(client, sync, user_id).await?;
            println!("{}", realized_report(&analysis));
        }
        Commands::Balance => {
            let view = load_balance_view(client, sync, user_id).await?;
            if let Some(total) = view.total_wallet_balance {
                println!("Wallet balance: {:.2}$\n", total);
            }
            println!("{}", balance_report(&view.assets, &view.missing_prices));
        }
        Commands::Export { output } => {
            let analysis = load_analysis(client, sync, user_id).await?;
            let bytes = export_csv(&analysis)?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Exported {} symbols to {}", analysis.len(), output.display());
            println!("Saved {}", output.display());
        }
    }
    Ok(())
}
