//! History error types

use dash_store::StoreError;

/// Errors raised by the version history store
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Key/value store rejected the operation
    #[error("history store error: {0}")]
    Store(#[from] StoreError),

    /// Version list could not be encoded or decoded
    #[error("history serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;
