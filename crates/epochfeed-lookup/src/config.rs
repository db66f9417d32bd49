//! Lookup configuration.

use std::time::Duration;

/// Default bound on a single store load.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default tolerance for updates stamped ahead of the local clock: one
/// top-level epoch (2^25 seconds).
pub const DEFAULT_MAX_CLOCK_SKEW: Duration = Duration::from_secs(1 << 25);

/// Configuration for [`lookup`](crate::lookup()).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// How long one probe may wait on the store.
    pub probe_timeout: Duration,

    /// How far past the local clock a time limit is honoured.
    ///
    /// Without a clue the search walks back one top-level epoch per miss
    /// from its horizon, so the horizon is capped at `now + max_clock_skew`.
    /// Updates stamped later than that are not found.
    pub max_clock_skew: Duration,
}

impl LookupConfig {
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_max_clock_skew(mut self, skew: Duration) -> Self {
        self.max_clock_skew = skew;
        self
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_clock_skew: DEFAULT_MAX_CLOCK_SKEW,
        }
    }
}
