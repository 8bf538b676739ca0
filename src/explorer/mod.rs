//! Paginated and derived chain views assembled from single-item RPC calls.
//!
//! Nothing here is atomic with respect to the chain: every result is valid as
//! of some instant during the request that produced it.

mod accounts;
mod blocks;
mod transactions;

pub use accounts::{ADDRESS_PATTERN, parse_address};
pub use blocks::page_start;

use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{BlockDetail, BlockSummary, NetworkOverview, TransactionSummary};
use crate::normalizer::{normalize_transaction, summarize_block};
use crate::rpc::{BlockRef, ChainRpc, RawBlock};
use alloy_primitives::B256;
use futures::future::join_all;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Blocks shown next to the latest block in the network overview.
pub const OVERVIEW_RECENT_BLOCKS: u64 = 5;

pub const TX_HASH_PATTERN: &str = r"^0x[0-9a-fA-F]{64}$";

static TX_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TX_HASH_PATTERN).expect("transaction hash pattern compiles"));

pub struct ChainExplorer<R> {
    rpc: R,
}

impl<R: ChainRpc> ChainExplorer<R> {
    pub fn new(rpc: R) -> Self {
        ChainExplorer { rpc }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Liveness probe: true iff the node answers `eth_blockNumber`.
    pub async fn check_connectivity(&self) -> bool {
        match self.rpc.block_number().await {
            Ok(tip) => {
                debug!("Node reachable, tip at block {}", tip);
                true
            }
            Err(e) => {
                debug!("Connectivity check failed: {:#}", e);
                false
            }
        }
    }

    pub async fn latest_block_summary(&self) -> ExplorerResult<BlockSummary> {
        let block = self
            .rpc
            .block(BlockRef::Latest, false)
            .await
            .map_err(ExplorerError::Lookup)?
            .ok_or_else(|| ExplorerError::not_found("the node returned no latest block"))?;

        Ok(summarize_block(&block))
    }

    /// A block together with all of its transactions.
    pub async fn block_detail(&self, number: u64) -> ExplorerResult<BlockDetail> {
        let block = self
            .rpc
            .block(BlockRef::Number(number), true)
            .await
            .map_err(ExplorerError::Lookup)?
            .ok_or_else(|| ExplorerError::not_found(format!("block #{number}")))?;

        let (transactions, dropped) = self.resolve_block_transactions(&block).await;

        Ok(BlockDetail {
            block: summarize_block(&block),
            transactions,
            dropped,
        })
    }

    pub async fn transaction_detail(&self, hash: &str) -> ExplorerResult<TransactionSummary> {
        let hash = hash.trim();
        if !TX_HASH_RE.is_match(hash) {
            return Err(ExplorerError::validation(format!(
                "'{hash}' is not a transaction hash (0x followed by 64 hex characters)"
            )));
        }
        let parsed = B256::from_str(hash)
            .map_err(|e| ExplorerError::validation(format!("'{hash}': {e}")))?;

        let (tx, receipt) = tokio::join!(
            self.rpc.transaction(parsed),
            self.rpc.transaction_receipt(parsed)
        );

        // An unknown hash is reported as such even if the receipt call failed.
        let tx = tx
            .map_err(ExplorerError::Lookup)?
            .ok_or_else(|| ExplorerError::not_found(format!("transaction {hash}")))?;
        let receipt = receipt.map_err(ExplorerError::Lookup)?;

        let timestamp = match tx.block_number {
            Some(number) => self
                .rpc
                .block(BlockRef::Number(number), false)
                .await
                .map_err(ExplorerError::Lookup)?
                .map(|block| block.timestamp),
            None => None,
        };

        Ok(normalize_transaction(&tx, receipt.as_ref(), timestamp))
    }

    /// Dashboard snapshot. Strict: any failing part fails the whole overview.
    pub async fn network_overview(&self) -> ExplorerResult<NetworkOverview> {
        let (latest_block, recent, fees, network) = tokio::try_join!(
            self.latest_block_summary(),
            self.block_page(1, OVERVIEW_RECENT_BLOCKS),
            async { self.rpc.fee_data().await.map_err(ExplorerError::Lookup) },
            async { self.rpc.network().await.map_err(ExplorerError::Lookup) },
        )?;

        Ok(NetworkOverview {
            latest_block,
            recent_blocks: recent.blocks,
            gas_price: fees.gas_price.to_string(),
            chain_id: network.chain_id,
        })
    }

    async fn tip(&self) -> ExplorerResult<u64> {
        self.rpc.block_number().await.map_err(ExplorerError::Lookup)
    }

    async fn fetch_block_lenient(&self, number: u64, full_transactions: bool) -> Option<RawBlock> {
        match self.rpc.block(BlockRef::Number(number), full_transactions).await {
            Ok(Some(block)) => Some(block),
            Ok(None) => {
                debug!("Block {} not available, skipping", number);
                None
            }
            Err(e) => {
                warn!("Failed to fetch block {}: {:#}", number, e);
                None
            }
        }
    }

    /// Fetches `numbers` concurrently, keeping their order and dropping any
    /// block that could not be fetched. Returns the blocks and the number
    /// dropped.
    async fn fetch_blocks(
        &self,
        numbers: impl Iterator<Item = u64>,
        full_transactions: bool,
    ) -> (Vec<RawBlock>, usize) {
        let results = join_all(numbers.map(|n| self.fetch_block_lenient(n, full_transactions))).await;
        let requested = results.len();
        let blocks: Vec<RawBlock> = results.into_iter().flatten().collect();
        let dropped = requested - blocks.len();
        (blocks, dropped)
    }
}

fn validate_page(page: u64, page_size: u64) -> ExplorerResult<()> {
    if page == 0 {
        return Err(ExplorerError::validation("page numbers start at 1"));
    }
    if page_size == 0 {
        return Err(ExplorerError::validation("page size must be at least 1"));
    }
    Ok(())
}
