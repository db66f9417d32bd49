//! # Epochfeed
//!
//! Mutable feeds on top of an immutable, content-addressed chunk store.
//!
//! A feed is identified by a [`Topic`] and the [`Address`] of its owner.
//! Each update is signed by the owner and stored at an address derived from
//! the feed and an [`Epoch`], a slot in a time-indexed tree. Readers find
//! the latest update, or the one current at some past time, by probing
//! epochs; nothing needs to be indexed or coordinated.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use epochfeed::{Cancellation, GenericSigner, Handler, HandlerConfig, Query, Signer, Topic};
//! use epochfeed::store::MemoryStore;
//!
//! async fn example() {
//!     let handler = Handler::new(MemoryStore::new(), HandlerConfig::default());
//!     let signer = GenericSigner::generate();
//!     let cancel = Cancellation::new();
//!
//!     let topic = Topic::new("weather/berlin", &[]).unwrap();
//!     handler.publish(&cancel, &signer, topic, &b"sunny"[..]).await.unwrap();
//!
//!     let feed = epochfeed::Feed::new(topic, signer.address());
//!     let outcome = handler.lookup(&cancel, Query::latest(feed)).await.unwrap();
//!     assert_eq!(&outcome.request.payload[..], b"sunny");
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `epochfeed::core` - Identity, epochs, signatures, update encoding
//! - `epochfeed::store` - Chunk store traits and backends
//! - `epochfeed::lookup` - Search strategies and the lookup orchestrator

pub mod error;
pub mod handler;

pub use epochfeed_core as core;
pub use epochfeed_lookup as lookup;
pub use epochfeed_store as store;

pub use error::{FeedError, Result};
pub use handler::{CacheEntry, Handler, HandlerConfig};

pub use epochfeed_core::{
    Address, Epoch, Feed, GenericSigner, Id, Reference, Request, Signature, Signer, Topic, Values,
};
pub use epochfeed_lookup::{Cancellation, FluxSearch, LookupConfig, LookupOutcome, Query, SearchStrategy};
