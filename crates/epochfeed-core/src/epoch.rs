//! Epochs: coarse time partitions that place updates without an index.
//!
//! An epoch at `level` L covers the time range `[base, base + 2^L)` where
//! `base` is the epoch time with its lowest L bits cleared. Together the
//! levels form a binary tree over time; a publisher places each update in
//! the epoch chosen by [`Epoch::next`], and readers walk the tree from the
//! top down.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Serialized epoch length: 7 bytes of base time plus the level byte.
pub const EPOCH_LENGTH: usize = 8;

/// Finest level: an epoch of a single time unit.
pub const LOWEST_LEVEL: u8 = 0;

/// Coarsest level a publisher will use: 2^25 time units (about a year in seconds).
pub const HIGHEST_LEVEL: u8 = 25;

/// Level of the first update in a feed.
pub const DEFAULT_LEVEL: u8 = HIGHEST_LEVEL;

/// Largest base time that fits in the 7-byte encoding.
pub const MAX_BASE: u64 = (1 << 56) - 1;

/// A time partition: a time and the level of the tree it sits at.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Epoch {
    pub time: u64,
    pub level: u8,
}

impl Epoch {
    /// "No hint": lookups start from scratch.
    pub const NO_CLUE: Self = Self { time: 0, level: 0 };

    pub const fn new(time: u64, level: u8) -> Self {
        Self { time, level }
    }

    /// Epoch of the first update of a feed.
    pub const fn first(now: u64) -> Self {
        Self {
            time: now,
            level: DEFAULT_LEVEL,
        }
    }

    /// Start of the time range covered by this epoch.
    pub fn base(&self) -> u64 {
        self.time & u64::MAX.checked_shl(u32::from(self.level)).unwrap_or(0)
    }

    /// Whether `self` and `other` name the same slot of the tree.
    pub fn is_same_epoch(&self, other: &Epoch) -> bool {
        self.level == other.level && self.base() == other.base()
    }

    /// Whether `self` comes after `other` in publishing order.
    pub fn later_than(&self, other: &Epoch) -> bool {
        if self.time == other.time {
            return self.level < other.level;
        }
        self.time >= other.time
    }

    /// The level of the update that follows `last` at time `now`.
    pub fn next_level(last: &Epoch, now: u64) -> u8 {
        // Zero out the common most significant bits of last base and now.
        let mut mix = last.base() ^ now;
        // Never go more than one level below the last one.
        if last.level > LOWEST_LEVEL {
            mix |= 1u64.checked_shl(u32::from(last.level - 1)).unwrap_or(0);
        }
        if mix > (u64::MAX >> (64 - u32::from(HIGHEST_LEVEL) - 1)) {
            return HIGHEST_LEVEL;
        }

        let mut mask = 1u64 << HIGHEST_LEVEL;
        for level in (LOWEST_LEVEL + 1..=HIGHEST_LEVEL).rev() {
            if mix & mask != 0 {
                return level;
            }
            mask >>= 1;
        }
        LOWEST_LEVEL
    }

    /// The epoch for an update published at `now`, after `last`.
    pub fn next(last: &Epoch, now: u64) -> Epoch {
        if *last == Epoch::NO_CLUE {
            return Epoch::first(now);
        }
        Epoch {
            time: now,
            level: Epoch::next_level(last, now),
        }
    }

    /// The 8-byte serialization: base little endian in bytes 0..7, level in byte 7.
    ///
    /// Only base and level are kept, so two epochs in the same slot serialize
    /// identically.
    pub fn binary_put(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != EPOCH_LENGTH {
            return Err(CoreError::length("epoch", EPOCH_LENGTH, buf.len()));
        }
        let base = self.base();
        if base > MAX_BASE {
            return Err(CoreError::InvalidValue(format!(
                "epoch base time {} does not fit in 56 bits",
                base
            )));
        }
        buf.copy_from_slice(&base.to_le_bytes());
        buf[7] = self.level;
        Ok(())
    }

    /// Restore an epoch from 8 bytes. The time is the slot's base.
    pub fn binary_get(buf: &[u8]) -> Result<Self> {
        if buf.len() != EPOCH_LENGTH {
            return Err(CoreError::length("epoch", EPOCH_LENGTH, buf.len()));
        }
        let mut time = [0u8; 8];
        time[..7].copy_from_slice(&buf[..7]);
        Ok(Self {
            time: u64::from_le_bytes(time),
            level: buf[7],
        })
    }
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch(t={}, L={}, base={})", self.time, self.level, self.base())
    }
}
