//! Scripted in-memory node used by the aggregation tests.

use super::{
    BlockRef, BlockTransactions, ChainRpc, FeeData, NetworkInfo, RawBlock, RawReceipt,
    RawTransaction,
};
use alloy_primitives::{Address, B256, U256};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
pub(crate) const BLOCK_TIME: u64 = 12;

pub(crate) fn block_hash(number: u64) -> B256 {
    B256::left_padding_from(&(number + 1).to_be_bytes())
}

pub(crate) fn tx_hash(block: u64, index: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xaa;
    bytes[8..16].copy_from_slice(&block.to_be_bytes());
    bytes[24..32].copy_from_slice(&index.to_be_bytes());
    B256::from(bytes)
}

pub(crate) fn sender(index: u64) -> Address {
    Address::with_last_byte(0x10 + index as u8)
}

#[derive(Default)]
pub(crate) struct MockRpc {
    tip: u64,
    blocks: HashMap<u64, RawBlock>,
    transactions: HashMap<B256, RawTransaction>,
    receipts: HashMap<B256, RawReceipt>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    failing_blocks: HashSet<u64>,
    failing_receipts: HashSet<B256>,
    failing_balances: bool,
    offline: bool,
    gas_price: u128,
    chain_id: u64,
    calls: AtomicUsize,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockRpc {
    /// Chain of blocks `0..=tip`, block `n` carrying `txs_per_block(n)`
    /// mined transactions with receipts.
    pub(crate) fn chain(tip: u64, txs_per_block: impl Fn(u64) -> u64) -> Self {
        let mut mock = MockRpc {
            tip,
            gas_price: 1_875_000_000,
            chain_id: 31337,
            ..MockRpc::default()
        };

        for number in 0..=tip {
            let txs: Vec<RawTransaction> = (0..txs_per_block(number))
                .map(|index| RawTransaction {
                    hash: tx_hash(number, index),
                    block_number: Some(number),
                    from: sender(index),
                    to: if index == 0 && number % 2 == 1 {
                        None
                    } else {
                        Some(Address::with_last_byte(0xee))
                    },
                    value: U256::from(number) * U256::from(1_000_000_000_000_000_000u64)
                        + U256::from(index),
                    gas_price: Some(1_000_000_000),
                })
                .collect();

            for tx in &txs {
                mock.receipts.insert(
                    tx.hash,
                    RawReceipt {
                        gas_used: 21_000,
                        status: true,
                    },
                );
                mock.transactions.insert(tx.hash, tx.clone());
            }

            mock.blocks.insert(
                number,
                RawBlock {
                    number,
                    hash: Some(block_hash(number)),
                    parent_hash: if number == 0 {
                        B256::ZERO
                    } else {
                        block_hash(number - 1)
                    },
                    timestamp: GENESIS_TIMESTAMP + number * BLOCK_TIME,
                    gas_used: 21_000 * txs.len() as u64,
                    gas_limit: 30_000_000,
                    miner: Address::with_last_byte(0x01),
                    transactions: BlockTransactions::Full(txs),
                },
            );
        }

        mock
    }

    pub(crate) fn with_block(mut self, block: RawBlock) -> Self {
        self.tip = self.tip.max(block.number);
        self.blocks.insert(block.number, block);
        self
    }

    pub(crate) fn with_transaction(mut self, tx: RawTransaction, receipt: Option<RawReceipt>) -> Self {
        if let Some(receipt) = receipt {
            self.receipts.insert(tx.hash, receipt);
        }
        self.transactions.insert(tx.hash, tx);
        self
    }

    pub(crate) fn without_block(mut self, number: u64) -> Self {
        self.blocks.remove(&number);
        self
    }

    pub(crate) fn failing_block(mut self, number: u64) -> Self {
        self.failing_blocks.insert(number);
        self
    }

    pub(crate) fn failing_receipt(mut self, hash: B256) -> Self {
        self.failing_receipts.insert(hash);
        self
    }

    pub(crate) fn without_receipt(mut self, hash: B256) -> Self {
        self.receipts.remove(&hash);
        self
    }

    pub(crate) fn with_account(mut self, address: Address, balance: U256, nonce: u64) -> Self {
        self.balances.insert(address, balance);
        self.nonces.insert(address, nonce);
        self
    }

    pub(crate) fn failing_balances(mut self) -> Self {
        self.failing_balances = true;
        self
    }

    pub(crate) fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Makes receipt and account lookups take `latency`, so overlapping
    /// calls show up in `peak_in_flight`.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of receipt and account lookups observed in flight
    /// at the same time.
    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn hold(&self) {
        let Some(latency) = self.latency else {
            return;
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(anyhow!("error sending request: connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn block_number(&self) -> Result<u64> {
        self.enter()?;
        Ok(self.tip)
    }

    async fn block(&self, block: BlockRef, full_transactions: bool) -> Result<Option<RawBlock>> {
        self.enter()?;
        let number = match block {
            BlockRef::Latest => self.tip,
            BlockRef::Number(number) => number,
        };
        if self.failing_blocks.contains(&number) {
            return Err(anyhow!("eth_getBlockByNumber failed for {number}"));
        }

        Ok(self.blocks.get(&number).cloned().map(|mut block| {
            if !full_transactions {
                if let BlockTransactions::Full(txs) = &block.transactions {
                    block.transactions =
                        BlockTransactions::Hashes(txs.iter().map(|tx| tx.hash).collect());
                }
            }
            block
        }))
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>> {
        self.enter()?;
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RawReceipt>> {
        self.enter()?;
        self.hold().await;
        if self.failing_receipts.contains(&hash) {
            return Err(anyhow!("eth_getTransactionReceipt failed for {hash}"));
        }
        Ok(self.receipts.get(&hash).copied())
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.enter()?;
        self.hold().await;
        if self.failing_balances {
            return Err(anyhow!("eth_getBalance request timeout after 30 seconds"));
        }
        Ok(self.balances.get(&address).copied().unwrap_or_default())
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.enter()?;
        self.hold().await;
        Ok(self.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn fee_data(&self) -> Result<FeeData> {
        self.enter()?;
        Ok(FeeData {
            gas_price: self.gas_price,
        })
    }

    async fn network(&self) -> Result<NetworkInfo> {
        self.enter()?;
        Ok(NetworkInfo {
            chain_id: self.chain_id,
        })
    }
}
