use crate::explorer::ChainExplorer;
use crate::history::SearchHistory;
use crate::poller::spawn_overview_poller;
use crate::query::formatters::{
    OutputFormat, format_account_session, format_block_detail, format_block_page, format_overview,
    format_transaction, format_transaction_page,
};
use crate::rpc::ChainRpc;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn cmd_status<R: ChainRpc>(explorer: &ChainExplorer<R>) -> Result<()> {
    if explorer.check_connectivity().await {
        println!("connected");
        Ok(())
    } else {
        anyhow::bail!("Node is not reachable")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageQuery {
    pub page: u64,
    pub page_size: u64,
}

pub async fn cmd_blocks<R: ChainRpc>(
    explorer: &ChainExplorer<R>,
    query: PageQuery,
    format: &OutputFormat,
) -> Result<()> {
    let page = explorer.block_page(query.page, query.page_size).await?;
    println!("{}", format_block_page(&page, format));
    Ok(())
}

pub async fn cmd_block<R: ChainRpc>(
    explorer: &ChainExplorer<R>,
    number: u64,
    format: &OutputFormat,
) -> Result<()> {
    let detail = explorer.block_detail(number).await?;
    println!("{}", format_block_detail(&detail, format));
    Ok(())
}

pub async fn cmd_transactions<R: ChainRpc>(
    explorer: &ChainExplorer<R>,
    query: PageQuery,
    scan_window: u64,
    format: &OutputFormat,
) -> Result<()> {
    let page_size = usize::try_from(query.page_size)?;
    let page = usize::try_from(query.page)?;
    let result = explorer
        .transaction_page(page, page_size, scan_window)
        .await?;
    println!("{}", format_transaction_page(&result, format));
    Ok(())
}

pub async fn cmd_transaction<R: ChainRpc>(
    explorer: &ChainExplorer<R>,
    hash: &str,
    format: &OutputFormat,
) -> Result<()> {
    let tx = explorer.transaction_detail(hash).await?;
    println!("{}", format_transaction(&tx, format));
    Ok(())
}

/// Looks up each address in turn as one browsing session and prints the
/// snapshots with the session's search history as one document.
/// Individual failures are reported on stderr and skipped.
pub async fn cmd_accounts<R: ChainRpc>(
    explorer: &ChainExplorer<R>,
    addresses: &[String],
    format: &OutputFormat,
) -> Result<()> {
    let mut history = SearchHistory::new();
    let mut snapshots = Vec::with_capacity(addresses.len());

    for address in addresses {
        match explorer.search_account(&mut history, address).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                if !e.is_validation() {
                    warn!("Account lookup for {} failed: {}", address, e);
                }
                eprintln!("{}", e.user_message());
            }
        }
    }

    println!("{}", format_account_session(&snapshots, &history, format));

    if snapshots.is_empty() && !addresses.is_empty() {
        anyhow::bail!("No account could be loaded");
    }
    Ok(())
}

pub async fn cmd_overview<R: ChainRpc + 'static>(
    explorer: Arc<ChainExplorer<R>>,
    watch: Option<Duration>,
    format: &OutputFormat,
) -> Result<()> {
    let Some(every) = watch else {
        let overview = explorer.network_overview().await?;
        println!("{}", format_overview(&overview, format));
        return Ok(());
    };

    let mut feed = spawn_overview_poller(explorer, every);
    loop {
        tokio::select! {
            update = feed.updates.recv() => match update {
                Some(Ok(overview)) => println!("{}", format_overview(&overview, format)),
                Some(Err(e)) => eprintln!("{}", e.user_message()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping overview refresh");
                break;
            }
        }
    }

    Ok(())
}
