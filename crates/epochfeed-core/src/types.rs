//! Strong type definitions shared with the store layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::hash::{keccak256, HASH_LENGTH};

/// A 32-byte store reference: the key under which a chunk is loaded and saved.
///
/// Feed updates live at `Id::addr()`; content-addressed chunks live at the
/// Keccak-256 of their bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reference(pub [u8; HASH_LENGTH]);

impl Reference {
    /// Create a new Reference from raw bytes.
    pub const fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Content-derived reference for `content`.
    pub fn of_content(content: &[u8]) -> Self {
        Self(keccak256(content))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }

    pub const ZERO: Self = Self([0u8; HASH_LENGTH]);
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Reference {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH]> for Reference {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Reference {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; HASH_LENGTH] = slice
            .try_into()
            .map_err(|_| CoreError::length("reference", HASH_LENGTH, slice.len()))?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_hex_roundtrip() {
        let r = Reference::from_bytes([0x42; 32]);
        let recovered = Reference::from_hex(&r.to_hex()).unwrap();
        assert_eq!(r, recovered);
    }

    #[test]
    fn test_reference_wrong_length() {
        let err = Reference::try_from(&[0u8; 31][..]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue(_)));
    }

    #[test]
    fn test_reference_debug() {
        let r = Reference::from_bytes([0xcd; 32]);
        assert_eq!(format!("{:?}", r), "Reference(cdcdcdcdcdcdcdcd)");
    }

    #[test]
    fn test_reference_of_content_deterministic() {
        assert_eq!(Reference::of_content(b"chunk"), Reference::of_content(b"chunk"));
        assert_ne!(Reference::of_content(b"chunk"), Reference::of_content(b"chunk2"));
    }
}
