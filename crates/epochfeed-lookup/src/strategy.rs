//! Epoch-tree search strategies.
//!
//! A strategy only sees epochs and the answers of a [`Probe`]; it never
//! touches the store. The orchestrator assumes nothing about the order or
//! number of probes, so strategies can be swapped freely.

use async_trait::async_trait;
use epochfeed_core::{Epoch, LOWEST_LEVEL};

use crate::error::Result;

/// Hint used when the caller has none, or the one given turned out stale.
///
/// Its level sits above every real level, so the next epoch derived from it
/// is always at the top of the tree.
pub const WORST_HINT: Epoch = Epoch { time: 0, level: 63 };

/// One read at a given epoch.
///
/// `Ok(Some(_))` is an acceptable update, `Ok(None)` means nothing usable is
/// there, and `Err(_)` aborts the whole search.
#[async_trait]
pub trait Probe<T>: Send + Sync {
    async fn read(&self, epoch: Epoch, now: u64) -> Result<Option<T>>;
}

/// Decides which epochs to probe to find the latest update at or before `now`.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    /// Search for the latest acceptable value.
    ///
    /// `hint` is the epoch of a previously known update, or
    /// [`Epoch::NO_CLUE`]. When several updates share a time, which one wins
    /// is up to the strategy.
    async fn search<T: Send>(
        &self,
        now: u64,
        hint: Epoch,
        probe: &dyn Probe<T>,
    ) -> Result<Option<T>>;
}

/// Sequential top-down descent of the epoch tree.
///
/// Starting from the hint (or the top of the tree) it walks towards `now`
/// following the same rule publishers use to pick epochs. A hit moves the
/// hint forward; a miss steps back to just before the missed epoch's base.
/// A hint that does not hold an update is discarded and the search restarts
/// from the top, bounded by the hint's base.
#[derive(Debug, Clone, Copy, Default)]
pub struct FluxSearch;

#[async_trait]
impl SearchStrategy for FluxSearch {
    async fn search<T: Send>(
        &self,
        now: u64,
        hint: Epoch,
        probe: &dyn Probe<T>,
    ) -> Result<Option<T>> {
        let mut hint = if hint == Epoch::NO_CLUE {
            WORST_HINT
        } else {
            hint
        };
        let mut t = now;
        let mut last_found = None;

        loop {
            let epoch = Epoch::next(&hint, t);
            if let Some(value) = probe.read(epoch, now).await? {
                if epoch.level == LOWEST_LEVEL || epoch.is_same_epoch(&hint) {
                    return Ok(Some(value));
                }
                last_found = Some(value);
                hint = epoch;
                continue;
            }

            if epoch.base() == hint.base() {
                if last_found.is_some() {
                    return Ok(last_found);
                }
                if hint == WORST_HINT {
                    return Ok(None);
                }
                // Nothing below the hint; check the hint itself.
                if let Some(value) = probe.read(hint, now).await? {
                    return Ok(Some(value));
                }
                t = hint.base();
                hint = WORST_HINT;
                continue;
            }

            let base = epoch.base();
            if base == 0 {
                return Ok(last_found);
            }
            t = base - 1;
        }
    }
}
