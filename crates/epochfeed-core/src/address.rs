//! Owner addresses and their self-checksumming text form.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::hash::keccak256;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account address: the last 20 bytes of the Keccak-256 of an
/// uncompressed secp256k1 public key.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Plain lowercase hex, as used on the wire and in JSON.
    pub fn to_lower_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Checksummed hex.
    ///
    /// The letters of the lowercase form are uppercased where the matching
    /// nibble of `keccak256(lowercase)` is 8 or more: the high nibble for
    /// even positions, the low one for odd positions.
    pub fn to_hex(&self) -> String {
        let lower = self.to_lower_hex();
        let hash = keccak256(lower.as_bytes());
        lower
            .bytes()
            .enumerate()
            .map(|(i, c)| {
                let nibble = if i % 2 == 0 {
                    hash[i / 2] >> 4
                } else {
                    hash[i / 2] & 0x0f
                };
                if c.is_ascii_alphabetic() && nibble >= 8 {
                    c.to_ascii_uppercase() as char
                } else {
                    c as char
                }
            })
            .collect()
    }

    /// Parse from hex in any case, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::length("address", ADDRESS_LENGTH, bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parse a mixed-case string, rejecting it if the casing does not match
    /// the checksum. All-lowercase and all-uppercase input carry no checksum
    /// and are accepted as is.
    pub fn from_checksummed_hex(s: &str) -> Result<Self> {
        let addr = Self::from_hex(s)?;
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let has_lower = digits.bytes().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.bytes().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && digits != addr.to_hex() {
            return Err(CoreError::InvalidValue(format!(
                "address checksum mismatch for {}",
                s
            )));
        }
        Ok(addr)
    }

    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_lower_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(de::Error::custom)
    }
}
