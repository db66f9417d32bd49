//! Topics: what a feed is about.
//!
//! A topic merges a human-readable name with an optional "related content"
//! byte string (typically the reference of the thing the feed talks about)
//! by XOR-ing both, zero padded, into 32 bytes.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::hash::xor_bytes;

/// Length of a topic in bytes; also the longest name or related content that
/// survives intact.
pub const TOPIC_LENGTH: usize = 32;

/// A 32-byte topic.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Topic(pub [u8; TOPIC_LENGTH]);

impl Topic {
    /// Derive a topic from a name and related content.
    ///
    /// Inputs longer than [`TOPIC_LENGTH`] are truncated. In that case the
    /// result is `Err(CoreError::TopicTooLong { topic })` where `topic` is the
    /// truncated, fully usable topic. Callers that accept truncation can use
    /// [`Topic::new_truncated`] instead.
    pub fn new(name: &str, related_content: &[u8]) -> Result<Self> {
        let topic = Self::new_truncated(name, related_content);
        if name.len() > TOPIC_LENGTH || related_content.len() > TOPIC_LENGTH {
            return Err(CoreError::TopicTooLong { topic });
        }
        Ok(topic)
    }

    /// Derive a topic, silently truncating over-long inputs.
    pub fn new_truncated(name: &str, related_content: &[u8]) -> Self {
        let mut topic = [0u8; TOPIC_LENGTH];
        let content = &related_content[..related_content.len().min(TOPIC_LENGTH)];
        topic[..content.len()].copy_from_slice(content);

        let name = name.as_bytes();
        let name = &name[..name.len().min(TOPIC_LENGTH)];
        let merged = topic;
        xor_bytes(&mut topic, &merged, name);
        Self(topic)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; TOPIC_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; TOPIC_LENGTH] {
        &self.0
    }

    /// Recover the name, given the same related content used at derivation.
    ///
    /// Bytes are taken up to the first zero byte, or all 32 if there is none.
    /// Names containing a zero byte, or names of 32 bytes or more, cannot be
    /// recovered exactly. Invalid UTF-8 is replaced lossily.
    pub fn name(&self, related_content: &[u8]) -> String {
        let mut name = self.0;
        let content = &related_content[..related_content.len().min(TOPIC_LENGTH)];
        xor_bytes(&mut name, &self.0, content);
        let end = name.iter().position(|&b| b == 0).unwrap_or(TOPIC_LENGTH);
        String::from_utf8_lossy(&name[..end]).into_owned()
    }

    /// Convert to a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from exactly 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| CoreError::InvalidValue(format!("cannot decode topic: {}", e)))?;
        let arr: [u8; TOPIC_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::length("topic", TOPIC_LENGTH, bytes.len()))?;
        Ok(Self(arr))
    }

    pub const ZERO: Self = Self([0u8; TOPIC_LENGTH]);
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Topic {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; TOPIC_LENGTH]> for Topic {
    fn from(bytes: [u8; TOPIC_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Topic::from_hex(&s).map_err(de::Error::custom)
    }
}
