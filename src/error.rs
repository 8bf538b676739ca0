use thiserror::Error;

/// Failure of a single query against the explorer.
///
/// Absent optional data (a pending transaction without a receipt, a block
/// without a hash) is never reported through this type.
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lookup failed: {0:#}")]
    Lookup(anyhow::Error),
}

impl ExplorerError {
    pub fn validation(message: impl Into<String>) -> Self {
        ExplorerError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ExplorerError::NotFound(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ExplorerError::Validation(_))
    }

    /// Message suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::Lookup(e) => interpret_rpc_error(&format!("{e:#}")),
            other => other.to_string(),
        }
    }
}

pub type ExplorerResult<T> = std::result::Result<T, ExplorerError>;

/// Creates user-friendly error messages for common RPC errors
pub fn interpret_rpc_error(error: &str) -> String {
    let lower = error.to_lowercase();
    if lower.contains("connection refused") || lower.contains("error sending request") {
        "Cannot connect to the RPC endpoint. Make sure the local node is running (e.g. `npx hardhat node`).".to_string()
    } else if lower.contains("timeout") || lower.contains("timed out") {
        "Request timed out. The RPC endpoint may be overloaded or unreachable.".to_string()
    } else if lower.contains("429") || lower.contains("rate limit") {
        "Too many requests to the RPC endpoint. Try again in a few moments.".to_string()
    } else if lower.contains("method not found") {
        "The requested method is not supported by this RPC endpoint.".to_string()
    } else {
        format!("RPC error: {error}")
    }
}
