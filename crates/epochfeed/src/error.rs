//! Error types for the feed handler.

use epochfeed_core::CoreError;
use epochfeed_lookup::LookupError;
use epochfeed_store::StoreError;
use thiserror::Error;

/// Errors that can occur during handler operations.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Malformed input, bad signature or encoding failure.
    #[error("feed error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Lookup error.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Nothing is known about the feed yet.
    #[error("feed not found: {0}")]
    NotFound(String),

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl FeedError {
    /// Whether the feed simply has no (known) updates.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FeedError::NotFound(_) | FeedError::Lookup(LookupError::NotFound)
        )
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, FeedError>;
