//! # Epochfeed Lookup
//!
//! Finds the update of a feed that was current at a given time.
//!
//! A lookup is driven by a [`SearchStrategy`]. The strategy decides which
//! epochs to look at and in which order; all it can do is ask a [`Probe`]
//! "is there an acceptable update at this epoch?". The orchestrator in
//! [`lookup()`] implements that probe against a chunk store: it counts reads,
//! bounds each load with a timeout, honours a [`Cancellation`] scope and
//! filters out updates that are undecodable, badly signed, or later than the
//! query's time limit.
//!
//! ## Example
//!
//! ```rust,no_run
//! use epochfeed_lookup::{lookup, Cancellation, FluxSearch, LookupConfig, Query};
//! # async fn example(store: epochfeed_store::MemoryStore, feed: epochfeed_core::Feed) {
//! let cancel = Cancellation::new();
//! let outcome = lookup(&cancel, &store, &Query::latest(feed), &LookupConfig::default(), &FluxSearch)
//!     .await
//!     .unwrap();
//! println!("latest payload after {} reads: {:?}", outcome.reads, outcome.request.payload);
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod lookup;
pub mod query;
pub mod strategy;

pub use cancel::Cancellation;
pub use config::LookupConfig;
pub use error::{LookupError, Result};
pub use lookup::{lookup, now_seconds, LookupOutcome};
pub use query::Query;
pub use strategy::{FluxSearch, Probe, SearchStrategy, WORST_HINT};
