use serde::Serialize;

pub const SEARCH_HISTORY_CAPACITY: usize = 5;

/// Addresses looked up during one session, most recent first.
///
/// Owned by the session that created it and handed to
/// [`ChainExplorer::search_account`](crate::explorer::ChainExplorer::search_account);
/// nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `address` to the front, dropping the oldest entry past capacity.
    pub fn record(&mut self, address: impl Into<String>) {
        let address = address.into();
        self.entries.retain(|entry| *entry != address);
        self.entries.insert(0, address);
        self.entries.truncate(SEARCH_HISTORY_CAPACITY);
    }

    pub fn list(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
