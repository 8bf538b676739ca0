//! Raw node records to canonical summaries. No I/O.

use crate::models::{BlockSummary, TransactionSummary};
use crate::rpc::{RawBlock, RawReceipt, RawTransaction};
use alloy_primitives::U256;
use alloy_primitives::utils::format_ether;

pub fn normalize_block(raw: Option<&RawBlock>) -> Option<BlockSummary> {
    raw.map(summarize_block)
}

pub fn summarize_block(raw: &RawBlock) -> BlockSummary {
    BlockSummary {
        number: raw.number,
        hash: raw.hash.map(|hash| format!("{hash:?}")).unwrap_or_default(),
        parent_hash: format!("{:?}", raw.parent_hash),
        timestamp: raw.timestamp,
        transaction_count: raw.transactions.len() as u64,
        gas_used: raw.gas_used.to_string(),
        gas_limit: raw.gas_limit.to_string(),
        miner: raw.miner.to_checksum(None),
    }
}

/// `timestamp` comes from the block that includes the transaction.
pub fn normalize_transaction(
    tx: &RawTransaction,
    receipt: Option<&RawReceipt>,
    timestamp: Option<u64>,
) -> TransactionSummary {
    TransactionSummary {
        hash: format!("{:?}", tx.hash),
        block_number: tx.block_number.unwrap_or_default(),
        from: tx.from.to_checksum(None),
        to: tx.to.map(|to| to.to_checksum(None)),
        value: format_eth(tx.value),
        gas_used: receipt.map(|r| r.gas_used.to_string()),
        gas_price: tx.gas_price.unwrap_or_default().to_string(),
        timestamp,
        status: receipt.map(|r| u8::from(r.status)),
    }
}

/// Wei to ether with insignificant zeros dropped: `1.5`, `0.0`, `100.0`.
pub fn format_eth(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}
