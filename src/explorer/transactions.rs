//! Transaction feed over the most recent blocks.
//!
//! The node cannot answer "the N latest transactions", so the feed is
//! manufactured by pulling every block inside a scan window and flattening
//! their transactions. `scan_window` trades request volume for how far back
//! the feed reaches.

use super::{ChainExplorer, validate_page};
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{TransactionPage, TransactionSummary};
use crate::normalizer::normalize_transaction;
use crate::rpc::{BlockTransactions, ChainRpc, RawBlock, RawTransaction};
use alloy_primitives::B256;
use futures::future::join_all;
use std::cmp::Reverse;
use tracing::{debug, info, warn};

impl<R: ChainRpc> ChainExplorer<R> {
    pub async fn transaction_page(
        &self,
        page: usize,
        page_size: usize,
        scan_window: u64,
    ) -> ExplorerResult<TransactionPage> {
        validate_page(page as u64, page_size as u64)?;
        if scan_window == 0 {
            return Err(ExplorerError::validation(
                "scan window must cover at least one block",
            ));
        }

        let tip = self.tip().await?;
        let window = scan_window.min(tip.saturating_add(1));
        let (blocks, mut dropped) = self.fetch_blocks((0..window).map(|i| tip - i), true).await;

        let mut transactions = Vec::new();
        for block in blocks.iter().filter(|b| !b.transactions.is_empty()) {
            let (resolved, skipped) = self.resolve_block_transactions(block).await;
            dropped += skipped;
            transactions.extend(resolved);
        }

        // Stable: same-timestamp transactions keep block scan order and
        // in-block index order.
        transactions.sort_by_key(|tx| Reverse(tx.timestamp.unwrap_or(0)));

        let total_count = transactions.len();
        info!(
            "Collected {} transactions from {} blocks ({} lookups dropped)",
            total_count,
            blocks.len(),
            dropped
        );

        let start = (page - 1).saturating_mul(page_size);
        let transactions = transactions
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect();

        Ok(TransactionPage {
            transactions,
            page,
            page_size,
            total_count,
            scanned_blocks: window,
            dropped,
        })
    }

    /// Normalizes every transaction of `block`, looking up receipts for the
    /// whole block concurrently. Transactions whose lookups fail are left
    /// out; the second value counts them.
    pub(crate) async fn resolve_block_transactions(
        &self,
        block: &RawBlock,
    ) -> (Vec<TransactionSummary>, usize) {
        let timestamp = Some(block.timestamp);
        let resolved: Vec<Option<TransactionSummary>> = match &block.transactions {
            BlockTransactions::Full(txs) => {
                join_all(txs.iter().map(|tx| self.resolve_full(tx, timestamp))).await
            }
            BlockTransactions::Hashes(hashes) => {
                join_all(hashes.iter().map(|hash| self.resolve_hash(*hash, timestamp))).await
            }
        };

        let requested = resolved.len();
        let transactions: Vec<TransactionSummary> = resolved.into_iter().flatten().collect();
        let dropped = requested - transactions.len();
        if dropped > 0 {
            warn!(
                "Dropped {} of {} transactions in block {}",
                dropped, requested, block.number
            );
        }
        (transactions, dropped)
    }

    async fn resolve_full(
        &self,
        tx: &RawTransaction,
        timestamp: Option<u64>,
    ) -> Option<TransactionSummary> {
        match self.rpc.transaction_receipt(tx.hash).await {
            Ok(receipt) => Some(normalize_transaction(tx, receipt.as_ref(), timestamp)),
            Err(e) => {
                warn!("Failed to fetch receipt for {:?}: {:#}", tx.hash, e);
                None
            }
        }
    }

    async fn resolve_hash(&self, hash: B256, timestamp: Option<u64>) -> Option<TransactionSummary> {
        let (tx, receipt) = tokio::join!(
            self.rpc.transaction(hash),
            self.rpc.transaction_receipt(hash)
        );

        let tx = match tx {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                debug!("Transaction {:?} not returned by the node, skipping", hash);
                return None;
            }
            Err(e) => {
                warn!("Failed to fetch transaction {:?}: {:#}", hash, e);
                return None;
            }
        };

        match receipt {
            Ok(receipt) => Some(normalize_transaction(&tx, receipt.as_ref(), timestamp)),
            Err(e) => {
                warn!("Failed to fetch receipt for {:?}: {:#}", hash, e);
                None
            }
        }
    }
}
