//! # Epochfeed Testkit
//!
//! Testing utilities for epochfeed.
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known inputs with expected outputs, to pin the wire
//!   formats (topic derivation, address checksums, ID addresses, digests)
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A signer plus a shared memory store, and helpers to lay
//!   down feed timelines
//!
//! ## Golden Vectors
//!
//! ```rust
//! use epochfeed_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{}: {}", name, detail);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use epochfeed_testkit::generators::feed;
//!
//! proptest! {
//!     #[test]
//!     fn map_key_is_stable(feed in feed()) {
//!         prop_assert_eq!(feed.map_key(), feed.map_key());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use generators::{feed, request_params, RequestParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
