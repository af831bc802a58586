//! Storage error types

/// Errors raised by backends and stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend rejected or failed the operation
    #[error("backend error: {0}")]
    Backend(String),

    /// Transport failure talking to the hosted backend
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Row or document (de)serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Document does not have the shape the store needs
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Backend settings are incomplete
    #[error("backend not configured: missing {0}")]
    NotConfigured(&'static str),
}

impl StoreError {
    /// Whether retrying could plausibly succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Backend(_) | Self::Io(_) => true,
            Self::Serialization(_) | Self::InvalidDocument(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
