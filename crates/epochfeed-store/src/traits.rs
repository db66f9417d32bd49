//! Store traits: the abstract interface to a content-addressed chunk store.
//!
//! These traits let feed code stay storage-agnostic. Implementations include
//! SQLite and in-memory; a network-backed store fits the same shape.

use async_trait::async_trait;
use bytes::Bytes;
use epochfeed_core::Reference;

use crate::error::Result;

/// Read side of a chunk store.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load the content stored at `reference`.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) when
    /// nothing is stored there.
    async fn load(&self, reference: &Reference) -> Result<Bytes>;
}

/// Write side with caller-supplied addressing.
///
/// Feed updates need this: their reference is derived from feed and epoch,
/// not from their content.
#[async_trait]
pub trait Saver: Send + Sync {
    /// Store `content` at `reference`.
    async fn save(&self, reference: &Reference, content: &[u8]) -> Result<()>;
}

/// Write side with content-derived addressing.
#[async_trait]
pub trait ContentSaver: Send + Sync {
    /// Store `content` at the Keccak-256 of its bytes and return that reference.
    async fn save_content(&self, content: &[u8]) -> Result<Reference>;
}

/// Everything feed lookups and publishing need.
pub trait LoadSaver: Loader + Saver {}

impl<T: Loader + Saver + ?Sized> LoadSaver for T {}

#[async_trait]
impl<T: Loader + ?Sized> Loader for std::sync::Arc<T> {
    async fn load(&self, reference: &Reference) -> Result<Bytes> {
        (**self).load(reference).await
    }
}

#[async_trait]
impl<T: Saver + ?Sized> Saver for std::sync::Arc<T> {
    async fn save(&self, reference: &Reference, content: &[u8]) -> Result<()> {
        (**self).save(reference, content).await
    }
}

#[async_trait]
impl<T: ContentSaver + ?Sized> ContentSaver for std::sync::Arc<T> {
    async fn save_content(&self, content: &[u8]) -> Result<Reference> {
        (**self).save_content(content).await
    }
}
