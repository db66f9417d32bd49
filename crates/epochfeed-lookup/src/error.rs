//! Error types for feed lookups.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while looking up a feed update.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The search finished without an acceptable update.
    #[error("no feed updates found")]
    NotFound,

    /// The caller's cancellation scope fired.
    #[error("lookup cancelled")]
    Cancelled,

    /// A single probe did not complete within the configured timeout.
    #[error("probe deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The store failed for a reason other than absence.
    #[error("store error: {0}")]
    Store(#[from] epochfeed_store::StoreError),

    /// An epoch could not be turned into a store address.
    #[error("invalid lookup input: {0}")]
    Core(#[from] epochfeed_core::CoreError),
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
