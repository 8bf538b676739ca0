use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub number: u64,
    /// Empty for the pending block.
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: u64,
    pub transaction_count: u64,
    pub gas_used: String,
    pub gas_limit: String,
    pub miner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    pub hash: String,
    pub block_number: u64,
    pub from: String,
    /// `None` for contract creation.
    pub to: Option<String>,
    /// Ether, already converted from wei.
    pub value: String,
    pub gas_used: Option<String>,
    /// Wei.
    pub gas_price: String,
    pub timestamp: Option<u64>,
    /// 1 = success, 0 = failure, `None` while no receipt is known.
    pub status: Option<u8>,
}

impl TransactionSummary {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub address: String,
    /// Ether.
    pub balance: String,
    pub balance_wei: String,
    /// Outgoing nonce, not the number of transactions touching the account.
    pub transaction_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountActivity {
    /// Holds ether but never sent a transaction.
    ReceiveOnly,
    Active,
    Unused,
}

impl AccountActivity {
    pub fn label(&self) -> &'static str {
        match self {
            AccountActivity::ReceiveOnly => "new / receive-only",
            AccountActivity::Active => "active",
            AccountActivity::Unused => "unused",
        }
    }
}

impl AccountSnapshot {
    pub fn activity(&self) -> AccountActivity {
        let funded = self.balance_wei != "0";
        if self.transaction_count > 0 {
            AccountActivity::Active
        } else if funded {
            AccountActivity::ReceiveOnly
        } else {
            AccountActivity::Unused
        }
    }
}

/// One page of blocks, newest first.
///
/// Valid as of some instant during the request; the tip may have moved
/// between the tip read and the block fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockPage {
    pub blocks: Vec<BlockSummary>,
    pub page: u64,
    pub page_size: u64,
    /// Tip + 1.
    pub total_blocks: u64,
    /// Block lookups that failed or came back empty.
    pub dropped: usize,
}

impl BlockPage {
    pub fn total_pages(&self) -> u64 {
        self.total_blocks.div_ceil(self.page_size)
    }
}

/// One page of the cross-block transaction feed, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionSummary>,
    pub page: usize,
    pub page_size: usize,
    /// Transactions found inside the scan window, not on the whole chain.
    pub total_count: usize,
    pub scanned_blocks: u64,
    /// Blocks or transactions skipped because a lookup failed or came back
    /// empty.
    pub dropped: usize,
}

impl TransactionPage {
    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDetail {
    pub block: BlockSummary,
    pub transactions: Vec<TransactionSummary>,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkOverview {
    pub latest_block: BlockSummary,
    pub recent_blocks: Vec<BlockSummary>,
    /// Wei.
    pub gas_price: String,
    pub chain_id: u64,
}
