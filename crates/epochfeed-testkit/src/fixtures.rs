//! Test fixtures and helpers.
//!
//! Common setup code for integration tests and benches.

use std::sync::Arc;

use epochfeed::{Handler, HandlerConfig};
use epochfeed_core::{Epoch, Feed, GenericSigner, Id, Reference, Request, Signer, Topic};
use epochfeed_store::{MemoryStore, Saver, StoreError};

/// A test fixture with a signer and a shared memory store.
pub struct TestFixture {
    pub signer: GenericSigner,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random signer.
    pub fn new() -> Self {
        Self {
            signer: GenericSigner::generate(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Create with a deterministic signer. Panics on an invalid scalar.
    pub fn with_secret(secret: [u8; 32]) -> Self {
        Self {
            signer: GenericSigner::from_bytes(&secret)
                .unwrap_or_else(|e| panic!("fixture secret must be a valid scalar: {}", e)),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// The signer's feed on `name`.
    pub fn feed(&self, name: &str) -> Feed {
        Feed::new(Topic::new_truncated(name, &[]), self.signer.address())
    }

    /// A handler over this fixture's store.
    pub fn handler(&self) -> Handler<Arc<MemoryStore>> {
        Handler::new(self.store.clone(), HandlerConfig::default())
    }

    /// A signed update of `feed` in `epoch`.
    pub fn make_update(&self, feed: Feed, epoch: Epoch, time: u64, payload: &[u8]) -> Request {
        let mut request = Request::new(Id::new(feed, epoch), time, payload.to_vec())
            .unwrap_or_else(|e| panic!("fixture payload must fit: {}", e));
        request
            .sign(&self.signer)
            .unwrap_or_else(|e| panic!("fixture signer must own the feed: {}", e));
        request
    }

    /// Publish one update per entry of `times` to the feed on `name`, each
    /// in the epoch a publisher would pick. Payloads are the decimal times.
    pub async fn publish_timeline(
        &self,
        name: &str,
        times: &[u64],
    ) -> Result<Vec<(Reference, Request)>, StoreError> {
        let feed = self.feed(name);
        let mut last = Epoch::NO_CLUE;
        let mut published = Vec::with_capacity(times.len());

        for &time in times {
            let epoch = Epoch::next(&last, time);
            let request = self.make_update(feed, epoch, time, time.to_string().as_bytes());
            let (reference, chunk) = request
                .to_chunk()
                .map_err(|e| StoreError::InvalidData(e.to_string()))?;
            self.store.save(&reference, &chunk).await?;
            published.push((reference, request));
            last = epoch;
        }

        Ok(published)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut secret = [0u8; 32];
            secret[24..].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            TestFixture::with_secret(secret)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use epochfeed_lookup::{Cancellation, Query};

    #[tokio::test]
    async fn test_timeline_is_findable() {
        let fixture = TestFixture::new();
        let published = fixture
            .publish_timeline("timeline", &[1_000, 2_000, 3_000])
            .await
            .unwrap();
        assert_eq!(published.len(), 3);
        assert_eq!(fixture.store.len(), 3);

        let handler = fixture.handler();
        let outcome = handler
            .lookup(&Cancellation::new(), Query::at(fixture.feed("timeline"), 2_500))
            .await
            .unwrap();
        assert_eq!(&outcome.request.payload[..], b"2000");
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        let addresses: Vec<_> = parties.iter().map(|p| p.signer.address()).collect();
        assert_ne!(addresses[0], addresses[1]);
        assert_ne!(addresses[1], addresses[2]);
        assert_eq!(addresses[0].to_hex(), "7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn test_updates_in_one_slot_share_an_address() {
        let fixture = TestFixture::new();
        let feed = fixture.feed("slot");
        let a = fixture.make_update(feed, Epoch::new(1_000, 8), 1_000, b"a");
        let b = fixture.make_update(feed, Epoch::new(1_001, 8), 1_001, b"b");
        assert_eq!(a.id.addr().unwrap(), b.id.addr().unwrap());
    }
}
