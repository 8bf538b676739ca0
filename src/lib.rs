pub mod config;
pub mod error;
pub mod explorer;
pub mod history;
pub mod models;
pub mod normalizer;
pub mod poller;
pub mod query;
pub mod rpc;

pub use error::{ExplorerError, ExplorerResult};
pub use explorer::ChainExplorer;
pub use history::SearchHistory;
