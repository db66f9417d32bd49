//! # Epochfeed Store
//!
//! Storage abstraction for epochfeed. Feeds only need a content-addressed
//! chunk store: load bytes by reference, and save bytes either at a reference
//! the caller picks (feed updates, placed at `Id::addr()`) or at the hash of
//! the content.
//!
//! ## Key Types
//!
//! - [`Loader`] / [`Saver`] / [`ContentSaver`] - The async adapter traits
//! - [`LoadSaver`] - What feed lookups and publishing need
//! - [`MemoryStore`] - In-memory store for tests and embedding
//! - [`SqliteStore`] - SQLite-based persistent store
//!
//! ## Usage
//!
//! ```rust,no_run
//! use epochfeed_core::Reference;
//! use epochfeed_store::{Loader, Saver, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("chunks.db").unwrap();
//!
//!     let reference = Reference::of_content(b"hello");
//!     store.save(&reference, b"hello").await.unwrap();
//!     let content = store.load(&reference).await.unwrap();
//!     assert_eq!(&content[..], b"hello");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absence is an error**: `load` fails with [`StoreError::NotFound`]
//! - **Overwrites**: saving at an existing reference replaces the content;
//!   feed updates never reuse a slot, so this only matters for misuse
//! - **No guarantees** beyond the local process: no replication, no consensus

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ContentSaver, LoadSaver, Loader, Saver};
