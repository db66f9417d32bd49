//! Update identifiers: where in the store an update for a feed and epoch lives.

use serde::{Deserialize, Serialize};

use crate::epoch::{Epoch, EPOCH_LENGTH};
use crate::error::{CoreError, Result};
use crate::feed::{Feed, FEED_LENGTH};
use crate::hash::keccak256;
use crate::types::Reference;

/// Serialized ID length: `feed(52) ∥ epoch(8)`.
pub const ID_LENGTH: usize = FEED_LENGTH + EPOCH_LENGTH;

/// A feed update slot.
///
/// Any party that knows the feed and the epoch can compute [`Id::addr`]
/// without asking anyone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id {
    pub feed: Feed,
    pub epoch: Epoch,
}

impl Id {
    pub const fn new(feed: Feed, epoch: Epoch) -> Self {
        Self { feed, epoch }
    }

    /// Serialize into exactly [`ID_LENGTH`] bytes.
    pub fn binary_put(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != ID_LENGTH {
            return Err(CoreError::length("id", ID_LENGTH, buf.len()));
        }
        self.feed.binary_put(&mut buf[..FEED_LENGTH])?;
        self.epoch.binary_put(&mut buf[FEED_LENGTH..])
    }

    /// Restore from exactly [`ID_LENGTH`] bytes.
    pub fn binary_get(buf: &[u8]) -> Result<Self> {
        if buf.len() != ID_LENGTH {
            return Err(CoreError::length("id", ID_LENGTH, buf.len()));
        }
        Ok(Self {
            feed: Feed::binary_get(&buf[..FEED_LENGTH])?,
            epoch: Epoch::binary_get(&buf[FEED_LENGTH..])?,
        })
    }

    pub fn to_bytes(&self) -> Result<[u8; ID_LENGTH]> {
        let mut buf = [0u8; ID_LENGTH];
        self.binary_put(&mut buf)?;
        Ok(buf)
    }

    /// Store reference of this slot: Keccak-256 of the 60-byte serialization.
    ///
    /// Depends only on the feed and the epoch's base and level.
    pub fn addr(&self) -> Result<Reference> {
        Ok(Reference(keccak256(&self.to_bytes()?)))
    }
}
