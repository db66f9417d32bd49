//! Feed: a particular user's stream of updates on a topic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::{Address, ADDRESS_LENGTH};
use crate::error::{CoreError, Result};
use crate::hash::HasherPool;
use crate::topic::{Topic, TOPIC_LENGTH};
use crate::values::Values;

/// Serialized feed length: `topic(32) ∥ user(20)`. The layout is unversioned.
pub const FEED_LENGTH: usize = TOPIC_LENGTH + ADDRESS_LENGTH;

/// Length of the `relatedcontent` query value once decoded.
const RELATED_CONTENT_LENGTH: usize = TOPIC_LENGTH;

/// Hasher states shared by every [`Feed::map_key`] call.
static FEED_HASHERS: HasherPool = HasherPool::new();

/// The identity of an update stream: a topic owned by a user.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feed {
    pub topic: Topic,
    pub user: Address,
}

impl Feed {
    pub const fn new(topic: Topic, user: Address) -> Self {
        Self { topic, user }
    }

    /// Serialize into `buf`, which must be exactly [`FEED_LENGTH`] bytes.
    pub fn binary_put(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != FEED_LENGTH {
            return Err(CoreError::length("feed", FEED_LENGTH, buf.len()));
        }
        buf[..TOPIC_LENGTH].copy_from_slice(&self.topic.0);
        buf[TOPIC_LENGTH..].copy_from_slice(&self.user.0);
        Ok(())
    }

    /// Restore a feed from exactly [`FEED_LENGTH`] bytes.
    pub fn binary_get(buf: &[u8]) -> Result<Self> {
        if buf.len() != FEED_LENGTH {
            return Err(CoreError::length("feed", FEED_LENGTH, buf.len()));
        }
        let mut feed = Feed::default();
        feed.topic.0.copy_from_slice(&buf[..TOPIC_LENGTH]);
        feed.user.0.copy_from_slice(&buf[TOPIC_LENGTH..]);
        Ok(feed)
    }

    /// The 52-byte serialization.
    pub fn to_bytes(&self) -> [u8; FEED_LENGTH] {
        let mut buf = [0u8; FEED_LENGTH];
        buf[..TOPIC_LENGTH].copy_from_slice(&self.topic.0);
        buf[TOPIC_LENGTH..].copy_from_slice(&self.user.0);
        buf
    }

    /// Hex of the 52-byte serialization.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse the hex form produced by [`Feed::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::binary_get(&hex::decode(s)?)
    }

    /// A 64-bit key for in-memory caches.
    ///
    /// Blake3 over the 52-byte serialization, first 8 bytes read little
    /// endian. Stable across runs and machines, but not collision free: never
    /// use it as a durable identifier.
    pub fn map_key(&self) -> u64 {
        let mut hasher = FEED_HASHERS.get();
        hasher.update(&self.to_bytes());
        let hash = hasher.finalize();
        let mut key = [0u8; 8];
        key.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(key)
    }

    /// Build a feed from query parameters.
    ///
    /// `topic` (64 hex chars) wins when present. Otherwise the topic is derived
    /// from `name` and `relatedcontent`; the latter must decode to at least 32
    /// bytes and anything past 32 is ignored. `user` must decode to at least 20
    /// bytes.
    pub fn from_values(values: &Values) -> Result<Self> {
        let topic = match values.get("topic").filter(|t| !t.is_empty()) {
            Some(topic) => Topic::from_hex(topic)?,
            None => {
                let name = values.get("name").unwrap_or_default();
                let related = match values.get("relatedcontent").filter(|r| !r.is_empty()) {
                    Some(related) => {
                        let bytes = hex::decode(related).map_err(|e| {
                            CoreError::InvalidValue(format!("relatedcontent is not hex: {}", e))
                        })?;
                        if bytes.len() < RELATED_CONTENT_LENGTH {
                            return Err(CoreError::InvalidValue(format!(
                                "relatedcontent must be a hex-encoded byte array at least {} bytes long, got {}",
                                RELATED_CONTENT_LENGTH,
                                bytes.len()
                            )));
                        }
                        bytes[..RELATED_CONTENT_LENGTH].to_vec()
                    }
                    None => Vec::new(),
                };
                Topic::new(name, &related)?
            }
        };

        let user = values.get("user").unwrap_or_default();
        let user = user.strip_prefix("0x").unwrap_or(user);
        let bytes = hex::decode(user)
            .map_err(|e| CoreError::InvalidValue(format!("user is not hex: {}", e)))?;
        if bytes.len() < ADDRESS_LENGTH {
            return Err(CoreError::InvalidValue(format!(
                "user address too short: expected {} bytes, got {}",
                ADDRESS_LENGTH,
                bytes.len()
            )));
        }
        let mut addr = Address::default();
        addr.0.copy_from_slice(&bytes[..ADDRESS_LENGTH]);

        Ok(Self { topic, user: addr })
    }

    /// Write `topic` and `user` into query parameters.
    pub fn append_values(&self, values: &mut Values) {
        values.set("topic", self.topic.to_hex());
        values.set("user", self.user.to_hex());
    }
}

impl fmt::Debug for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Feed({:?}, {:?})", self.topic, self.user)
    }
}
