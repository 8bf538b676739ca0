//! The single-item chain queries the explorer is built on.
//!
//! [`ChainRpc`] is the only seam between the aggregation layer and the node.
//! Every call either returns a value (possibly absent) or fails; nothing here
//! paginates or batches.

pub mod client;
#[cfg(test)]
pub(crate) mod mock;

use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;

pub use client::RpcClient;

/// Block selector accepted by [`ChainRpc::block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Latest,
    Number(u64),
}

/// Transactions as returned inside a block, depending on the
/// `includeTransactions` flag of the request.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockTransactions {
    Hashes(Vec<B256>),
    Full(Vec<RawTransaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub number: u64,
    /// Unset for the pending block.
    pub hash: Option<B256>,
    pub parent_hash: B256,
    pub timestamp: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub miner: Address,
    pub transactions: BlockTransactions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub hash: B256,
    /// Unset while the transaction is pending.
    pub block_number: Option<u64>,
    pub from: Address,
    /// Unset for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub gas_price: Option<u128>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReceipt {
    pub gas_used: u64,
    pub status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeData {
    pub gas_price: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
}

#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn block_number(&self) -> Result<u64>;

    async fn block(&self, block: BlockRef, full_transactions: bool) -> Result<Option<RawBlock>>;

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RawReceipt>>;

    async fn balance(&self, address: Address) -> Result<U256>;

    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn fee_data(&self) -> Result<FeeData>;

    async fn network(&self) -> Result<NetworkInfo>;
}
