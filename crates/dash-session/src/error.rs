//! Session error types

use dash_history::HistoryError;
use dash_schema::ValidationError;
use dash_store::StoreError;

use crate::transfer::ImportError;

/// Errors raised by editor sessions and their configuration
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Persisting or loading the tenant document failed
    #[error("storage failed: {0}")]
    Store(#[from] StoreError),

    /// Version history could not be read or written
    #[error("history failed: {0}")]
    History(#[from] HistoryError),

    /// Configuration does not satisfy the schema
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// Imported document was rejected
    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    /// Document could not be encoded
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Runtime configuration file could not be parsed
    #[error("invalid settings file: {0}")]
    Settings(#[from] toml::de::Error),

    /// Runtime configuration value is malformed
    #[error("invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },

    /// Local file access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
