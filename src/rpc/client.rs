use super::{
    BlockRef, BlockTransactions, ChainRpc, FeeData, NetworkInfo, RawBlock, RawReceipt,
    RawTransaction,
};
use crate::config::Config;
use alloy::consensus::Transaction as _;
use alloy::network::ReceiptResponse;
use alloy::providers::fillers::FillProvider;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{
    Block, BlockNumberOrTag, BlockTransactions as AlloyBlockTransactions, Transaction,
    TransactionReceipt,
};
use alloy::transports::TransportResult;
use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

type AlloyFullProvider = FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::GasFiller,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::BlobGasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::NonceFiller,
                    alloy::providers::fillers::ChainIdFiller,
                >,
            >,
        >,
    >,
    alloy::providers::RootProvider,
>;

/// HTTP JSON-RPC client with per-request timeout, retries and round-robin
/// failover between the configured endpoints.
#[derive(Clone)]
pub struct RpcClient {
    providers: Vec<AlloyFullProvider>,
    urls: Vec<String>,
    current_provider: Arc<AtomicUsize>,
    max_retries: usize,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(config: &Config) -> Result<Self> {
        let rpc_urls = &config.json_rpc_urls;
        if rpc_urls.is_empty() {
            return Err(anyhow::anyhow!("At least one RPC URL must be provided"));
        }

        let mut providers = Vec::new();
        for url in rpc_urls {
            let parsed_url = url
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", url))?;
            let provider: AlloyFullProvider = ProviderBuilder::new().connect_http(parsed_url);
            providers.push(provider);
        }

        Ok(RpcClient {
            providers,
            urls: rpc_urls.to_vec(),
            current_provider: Arc::new(AtomicUsize::new(0)),
            max_retries: config.max_retries,
            request_timeout: config.request_timeout,
        })
    }

    fn get_provider(&self) -> &AlloyFullProvider {
        let index = self.current_provider.load(Ordering::Relaxed) % self.providers.len();
        &self.providers[index]
    }

    pub fn get_current_url(&self) -> &str {
        let index = self.current_provider.load(Ordering::Relaxed) % self.urls.len();
        &self.urls[index]
    }

    pub fn rotate_provider(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current_provider.store(next, Ordering::Relaxed);

        if self.providers.len() > 1 {
            debug!("Rotating to RPC provider #{}", next);
        }
    }

    fn get_retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.max_retries)
    }

    fn handle_error(&self, method: &str, error_str: &str) {
        warn!(
            "RPC error on {} ({}): {}, rotating provider",
            self.get_current_url(),
            method,
            error_str
        );
        self.rotate_provider();
    }

    fn handle_timeout(&self, method: &str) -> anyhow::Error {
        warn!(
            "{} timed out after {} seconds on {}, rotating provider",
            method,
            self.request_timeout.as_secs(),
            self.get_current_url()
        );
        self.rotate_provider();
        anyhow::anyhow!(
            "{} request timeout after {} seconds",
            method,
            self.request_timeout.as_secs()
        )
    }

    /// Runs one provider call under the timeout and retry policy.
    async fn request<T, F, Fut>(&self, method: &'static str, call: F) -> Result<T>
    where
        F: Fn(AlloyFullProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let call = &call;
        Retry::spawn(self.get_retry_strategy(), move || {
            let provider = self.get_provider().clone();
            async move {
                match timeout(self.request_timeout, call(provider)).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => {
                        let error_str = e.to_string();
                        self.handle_error(method, &error_str);
                        Err(anyhow::anyhow!("{} failed: {}", method, error_str))
                    }
                    Err(_) => Err(self.handle_timeout(method)),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn block_number(&self) -> Result<u64> {
        self.request("eth_blockNumber", |provider| async move {
            provider.get_block_number().await
        })
        .await
    }

    async fn block(&self, block: BlockRef, full_transactions: bool) -> Result<Option<RawBlock>> {
        let tag = match block {
            BlockRef::Latest => BlockNumberOrTag::Latest,
            BlockRef::Number(number) => BlockNumberOrTag::Number(number),
        };

        let block = self
            .request("eth_getBlockByNumber", move |provider| async move {
                let call = provider.get_block_by_number(tag);
                if full_transactions {
                    call.full().await
                } else {
                    call.hashes().await
                }
            })
            .await?;

        Ok(block.map(raw_block))
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RawTransaction>> {
        let tx = self
            .request("eth_getTransactionByHash", move |provider| async move {
                provider.get_transaction_by_hash(hash).await
            })
            .await?;

        Ok(tx.map(raw_transaction))
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RawReceipt>> {
        let receipt = self
            .request("eth_getTransactionReceipt", move |provider| async move {
                provider.get_transaction_receipt(hash).await
            })
            .await?;

        Ok(receipt.map(raw_receipt))
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", move |provider| async move {
            provider.get_balance(address).await
        })
        .await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.request("eth_getTransactionCount", move |provider| async move {
            provider.get_transaction_count(address).await
        })
        .await
    }

    async fn fee_data(&self) -> Result<FeeData> {
        let gas_price = self
            .request("eth_gasPrice", |provider| async move {
                provider.get_gas_price().await
            })
            .await?;

        Ok(FeeData { gas_price })
    }

    async fn network(&self) -> Result<NetworkInfo> {
        let chain_id = self
            .request("eth_chainId", |provider| async move {
                provider.get_chain_id().await
            })
            .await?;

        Ok(NetworkInfo { chain_id })
    }
}

fn raw_block(block: Block) -> RawBlock {
    let transactions = match block.transactions {
        AlloyBlockTransactions::Full(txs) => {
            BlockTransactions::Full(txs.into_iter().map(raw_transaction).collect())
        }
        AlloyBlockTransactions::Hashes(hashes) => BlockTransactions::Hashes(hashes),
        AlloyBlockTransactions::Uncle => BlockTransactions::Hashes(Vec::new()),
    };

    let header = &block.header;
    RawBlock {
        number: header.number,
        // The RPC header type always carries a hash. Only the pending block
        // lacks one, and `BlockRef` never selects it.
        hash: Some(header.hash),
        parent_hash: header.parent_hash,
        timestamp: header.timestamp,
        gas_used: header.gas_used,
        gas_limit: header.gas_limit,
        miner: header.beneficiary,
        transactions,
    }
}

fn raw_transaction(tx: Transaction) -> RawTransaction {
    let envelope = tx.inner.inner();
    RawTransaction {
        hash: *envelope.tx_hash(),
        block_number: tx.block_number,
        from: tx.inner.signer(),
        to: envelope.to(),
        value: envelope.value(),
        // Mined EIP-1559 transactions only carry a fee cap; report what was paid.
        gas_price: tx.effective_gas_price.or_else(|| envelope.gas_price()),
    }
}

fn raw_receipt(receipt: TransactionReceipt) -> RawReceipt {
    RawReceipt {
        gas_used: ReceiptResponse::gas_used(&receipt),
        status: ReceiptResponse::status(&receipt),
    }
}
