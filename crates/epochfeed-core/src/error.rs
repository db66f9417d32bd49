//! Error types for Epochfeed Core.

use thiserror::Error;

use crate::topic::Topic;

/// Core errors that can occur while building identifiers, parsing input or
/// checking signatures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Wrong buffer length, malformed input or an out-of-range value.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The name or related content did not fit in a topic.
    ///
    /// Advisory: `topic` holds the usable, truncated topic.
    #[error("topic is too long, max length is 32 bytes")]
    TopicTooLong { topic: Topic },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("unsupported update version: {0}")]
    UnsupportedVersion(u8),
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidValue(format!("malformed hex: {}", e))
    }
}

impl CoreError {
    /// Shorthand for the length-mismatch flavour of [`CoreError::InvalidValue`].
    pub(crate) fn length(what: &str, expected: usize, got: usize) -> Self {
        CoreError::InvalidValue(format!(
            "incorrect slice size for {}: expected {}, got {}",
            what, expected, got
        ))
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
