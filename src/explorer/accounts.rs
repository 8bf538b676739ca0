use super::ChainExplorer;
use crate::error::{ExplorerError, ExplorerResult};
use crate::history::SearchHistory;
use crate::models::AccountSnapshot;
use crate::normalizer::format_eth;
use crate::rpc::ChainRpc;
use alloy_primitives::Address;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

pub const ADDRESS_PATTERN: &str = r"^0x[a-fA-F0-9]{40}$";

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_PATTERN).expect("address pattern compiles"));

/// Accepts `0x` followed by exactly 40 hex digits, any letter case,
/// without checksum verification.
pub fn parse_address(address: &str) -> ExplorerResult<Address> {
    if !ADDRESS_RE.is_match(address) {
        return Err(ExplorerError::validation(format!(
            "'{address}' is not an Ethereum address (0x followed by 40 hex characters)"
        )));
    }

    Address::from_str(address)
        .map_err(|e| ExplorerError::validation(format!("'{address}': {e}")))
}

impl<R: ChainRpc> ChainExplorer<R> {
    /// Balance and nonce of `address`, fetched together. Either lookup
    /// failing fails the snapshot.
    pub async fn account_snapshot(&self, address: &str) -> ExplorerResult<AccountSnapshot> {
        let parsed = parse_address(address)?;

        let (balance, transaction_count) = tokio::try_join!(
            self.rpc.balance(parsed),
            self.rpc.transaction_count(parsed)
        )
        .map_err(|e| ExplorerError::Lookup(e.context(format!("account {address}"))))?;

        debug!(
            "Account {} holds {} wei with nonce {}",
            address, balance, transaction_count
        );

        Ok(AccountSnapshot {
            address: address.to_string(),
            balance: format_eth(balance),
            balance_wei: balance.to_string(),
            transaction_count,
        })
    }

    /// Snapshot lookup that records `address` in `history` when it succeeds.
    pub async fn search_account(
        &self,
        history: &mut SearchHistory,
        address: &str,
    ) -> ExplorerResult<AccountSnapshot> {
        let address = address.trim();
        let snapshot = self.account_snapshot(address).await?;
        history.record(address);
        Ok(snapshot)
    }
}
