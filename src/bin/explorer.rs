use anyhow::Result;
use chain_viewer::config::Config;
use chain_viewer::error::ExplorerError;
use chain_viewer::explorer::ChainExplorer;
use chain_viewer::query::commands::{
    PageQuery, cmd_accounts, cmd_block, cmd_blocks, cmd_overview, cmd_status, cmd_transaction,
    cmd_transactions,
};
use chain_viewer::query::formatters::OutputFormat;
use chain_viewer::rpc::RpcClient;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "explorer")]
#[command(about = "Browse blocks, transactions and accounts of a local Ethereum node", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    /// Overrides JSON_RPC_URL.
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exit successfully iff the node answers.
    Status,
    Overview {
        /// Keep refreshing every POLL_INTERVAL_SECS until interrupted.
        #[arg(long, default_value = "false")]
        watch: bool,
    },
    Blocks {
        #[arg(long, default_value = "1")]
        page: u64,

        #[arg(long)]
        page_size: Option<u64>,
    },
    Block {
        number: u64,
    },
    Transactions {
        #[arg(long, default_value = "1")]
        page: u64,

        #[arg(long)]
        page_size: Option<u64>,

        /// Number of recent blocks to collect transactions from.
        #[arg(long)]
        scan_window: Option<u64>,
    },
    Tx {
        hash: String,
    },
    Account {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let mut config = Config::from_env()?;
    if let Some(url) = cli.rpc_url {
        config.json_rpc_urls = vec![url];
    }
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.json_rpc_urls.len()
    );

    let client = RpcClient::new(&config)?;
    let explorer = Arc::new(ChainExplorer::new(client));

    if let Err(e) = run(cli.command, explorer, &config, &format).await {
        match e.downcast_ref::<ExplorerError>() {
            Some(err) => error!("{}", err.user_message()),
            None => error!("{:#}", e),
        }
        return Err(e);
    }

    Ok(())
}

async fn run(
    command: Commands,
    explorer: Arc<ChainExplorer<RpcClient>>,
    config: &Config,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        Commands::Status => cmd_status(explorer.as_ref()).await?,
        Commands::Overview { watch } => {
            let every = watch.then_some(config.poll_interval);
            cmd_overview(explorer, every, format).await?;
        }
        Commands::Blocks { page, page_size } => {
            let query = PageQuery {
                page,
                page_size: page_size.unwrap_or(config.blocks_per_page),
            };
            cmd_blocks(explorer.as_ref(), query, format).await?;
        }
        Commands::Block { number } => cmd_block(explorer.as_ref(), number, format).await?,
        Commands::Transactions {
            page,
            page_size,
            scan_window,
        } => {
            let query = PageQuery {
                page,
                page_size: page_size.unwrap_or(config.transactions_per_page as u64),
            };
            let scan_window = scan_window.unwrap_or(config.transaction_scan_window);
            cmd_transactions(explorer.as_ref(), query, scan_window, format).await?;
        }
        Commands::Tx { hash } => cmd_transaction(explorer.as_ref(), &hash, format).await?,
        Commands::Account { addresses } => {
            cmd_accounts(explorer.as_ref(), &addresses, format).await?
        }
    }

    Ok(())
}
