//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use epochfeed_core::Reference;

use crate::error::{Result, StoreError};
use crate::traits::{ContentSaver, Loader, Saver};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// Every `load` call, hit or miss, bumps a counter so tests can see how
/// many probes a lookup issued.
pub struct MemoryStore {
    chunks: RwLock<HashMap<Reference, Bytes>>,
    loads: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
            loads: AtomicU64::new(0),
        }
    }

    /// Number of chunks stored.
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Whether anything is stored at `reference`. Does not count as a load.
    pub fn contains(&self, reference: &Reference) -> bool {
        self.chunks.read().contains_key(reference)
    }

    /// Remove the chunk at `reference`, returning it if present.
    pub fn remove(&self, reference: &Reference) -> Option<Bytes> {
        self.chunks.write().remove(reference)
    }

    /// Total number of `load` calls served so far.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Reset the load counter to zero.
    pub fn reset_loads(&self) {
        self.loads.store(0, Ordering::Relaxed);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Loader for MemoryStore {
    async fn load(&self, reference: &Reference) -> Result<Bytes> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.chunks
            .read()
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_hex()))
    }
}

#[async_trait]
impl Saver for MemoryStore {
    async fn save(&self, reference: &Reference, content: &[u8]) -> Result<()> {
        self.chunks
            .write()
            .insert(*reference, Bytes::copy_from_slice(content));
        Ok(())
    }
}

#[async_trait]
impl ContentSaver for MemoryStore {
    async fn save_content(&self, content: &[u8]) -> Result<Reference> {
        let reference = Reference::of_content(content);
        self.save(&reference, content).await?;
        Ok(reference)
    }
}
