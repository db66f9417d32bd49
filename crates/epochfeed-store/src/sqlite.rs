//! SQLite implementation of the store traits.
//!
//! The persistent backend. It uses rusqlite with bundled SQLite, wrapped in
//! async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use epochfeed_core::Reference;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ContentSaver, Loader, Saver};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of chunks stored.
    pub async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl Loader for SqliteStore {
    async fn load(&self, reference: &Reference) -> Result<Bytes> {
        let reference = *reference;
        self.blocking(move |conn| {
            let content: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT content FROM chunks WHERE reference = ?1",
                    params![reference.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            content
                .map(Bytes::from)
                .ok_or_else(|| StoreError::NotFound(reference.to_hex()))
        })
        .await
    }
}

#[async_trait]
impl Saver for SqliteStore {
    async fn save(&self, reference: &Reference, content: &[u8]) -> Result<()> {
        let reference = *reference;
        let content = content.to_vec();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO chunks (reference, content, stored_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(reference) DO UPDATE SET
                    content = excluded.content,
                    stored_at = excluded.stored_at",
                params![reference.as_bytes().as_slice(), content, now_millis()],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ContentSaver for SqliteStore {
    async fn save_content(&self, content: &[u8]) -> Result<Reference> {
        let reference = Reference::of_content(content);
        self.save(&reference, content).await?;
        Ok(reference)
    }
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = SqliteStore::open_memory().unwrap();
        let reference = Reference::from_bytes([3u8; 32]);

        store.save(&reference, b"update chunk").await.unwrap();

        let content = store.load(&reference).await.unwrap();
        assert_eq!(&content[..], b"update chunk");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store.load(&Reference::ZERO).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = SqliteStore::open_memory().unwrap();
        let reference = Reference::from_bytes([4u8; 32]);

        store.save(&reference, b"one").await.unwrap();
        store.save(&reference, b"two").await.unwrap();

        assert_eq!(&store.load(&reference).await.unwrap()[..], b"two");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_content() {
        let store = SqliteStore::open_memory().unwrap();
        let reference = store.save_content(b"payload").await.unwrap();
        assert_eq!(reference, Reference::of_content(b"payload"));
        assert_eq!(&store.load(&reference).await.unwrap()[..], b"payload");
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.db");
        let reference = Reference::from_bytes([9u8; 32]);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save(&reference, b"durable").await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(&store.load(&reference).await.unwrap()[..], b"durable");
    }
}
