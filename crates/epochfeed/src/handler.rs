//! The feed handler: publishing, lookups and the per-feed cache.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use epochfeed_core::{Epoch, Feed, Id, Reference, Request, Signer, Topic};
use epochfeed_lookup::{
    now_seconds, Cancellation, FluxSearch, LookupConfig, LookupOutcome, Query, SearchStrategy,
};
use epochfeed_store::LoadSaver;

use crate::error::{FeedError, Result};

/// Configuration for a [`Handler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Settings for every lookup the handler runs.
    pub lookup: LookupConfig,
}

impl HandlerConfig {
    pub fn with_probe_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.lookup = self.lookup.with_probe_timeout(timeout);
        self
    }
}

/// The most recent update the handler has seen for a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub epoch: Epoch,
    pub time: u64,
    /// Where the update chunk is stored.
    pub reference: Reference,
    pub payload: Bytes,
}

impl CacheEntry {
    fn of(request: &Request, reference: Reference) -> Self {
        Self {
            epoch: *request.epoch(),
            time: request.time,
            reference,
            payload: request.payload.clone(),
        }
    }

    /// Whether `request` comes after this entry in publishing order.
    fn is_superseded_by(&self, request: &Request) -> bool {
        request.time > self.time
            || (request.time == self.time && request.epoch().level < self.epoch.level)
    }
}

/// Publishes and looks up feed updates on a chunk store.
///
/// Keeps the latest known update of every feed it touched, keyed by
/// [`Feed::map_key`]. The cache only speeds things up: a lookup uses the
/// cached epoch as its hint, and [`Handler::update`] uses it to refuse
/// updates that could not be newer than one already published.
pub struct Handler<S: LoadSaver, A: SearchStrategy = FluxSearch> {
    store: S,
    config: HandlerConfig,
    strategy: A,
    cache: RwLock<HashMap<u64, CacheEntry>>,
}

impl<S: LoadSaver> Handler<S, FluxSearch> {
    /// Create a handler that searches with [`FluxSearch`].
    pub fn new(store: S, config: HandlerConfig) -> Self {
        Self::with_strategy(store, config, FluxSearch)
    }
}

impl<S: LoadSaver, A: SearchStrategy> Handler<S, A> {
    pub fn with_strategy(store: S, config: HandlerConfig, strategy: A) -> Self {
        Self {
            store,
            config,
            strategy,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publishing
    // ─────────────────────────────────────────────────────────────────────────

    /// Prepare an unsigned, empty update for `feed` at the current time.
    ///
    /// Looks up the feed's latest update first so the new one lands in the
    /// epoch that follows it. A feed without updates starts at the top.
    pub async fn new_request(&self, cancel: &Cancellation, feed: &Feed) -> Result<Request> {
        let now = now_seconds();

        let epoch = match self.lookup(cancel, Query::latest(*feed)).await {
            Ok(outcome) => Epoch::next(outcome.request.epoch(), now),
            Err(e) if e.is_not_found() => Epoch::first(now),
            Err(e) => return Err(e),
        };

        Ok(Request::new(Id::new(*feed, epoch), now, Bytes::new())?)
    }

    /// Store a signed update and remember it as the feed's latest.
    ///
    /// Refuses updates whose signature does not recover to the feed owner,
    /// and updates that are not newer than the one already cached. The check
    /// and the cache entry are taken together, so of two concurrent updates
    /// to the same slot only one is stored. A failed save gives the slot back.
    pub async fn update(&self, request: &Request) -> Result<Reference> {
        request.verify()?;

        let (reference, chunk) = request.to_chunk()?;
        let previous = self.claim(request, reference)?;

        if let Err(e) = self.store.save(&reference, &chunk).await {
            self.release(request.feed(), reference, previous);
            return Err(e.into());
        }

        tracing::info!(
            feed = ?request.feed(),
            epoch = ?request.epoch(),
            %reference,
            "published feed update"
        );
        Ok(reference)
    }

    /// Sign `payload` as the next update of `signer`'s feed on `topic` and
    /// store it.
    pub async fn publish<G: Signer + ?Sized>(
        &self,
        cancel: &Cancellation,
        signer: &G,
        topic: Topic,
        payload: impl Into<Bytes>,
    ) -> Result<Reference> {
        let payload = payload.into();
        let feed = Feed::new(topic, signer.address());

        let mut request = self.new_request(cancel, &feed).await?;
        request.set_payload(payload)?;
        request.sign(signer)?;
        self.update(&request).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a lookup, hinted by the cache when the query carries no hint.
    pub async fn lookup(&self, cancel: &Cancellation, mut query: Query) -> Result<LookupOutcome> {
        if query.hint == Epoch::NO_CLUE {
            if let Some(epoch) = self.latest_epoch(&query.feed) {
                query.hint = epoch;
            }
        }

        let outcome = epochfeed_lookup::lookup(
            cancel,
            &self.store,
            &query,
            &self.config.lookup,
            &self.strategy,
        )
        .await?;

        let reference = outcome.request.id.addr()?;
        self.remember(&outcome.request, reference);
        Ok(outcome)
    }

    /// Reference and payload of the latest cached update of `feed`.
    pub fn get_content(&self, feed: &Feed) -> Result<(Reference, Bytes)> {
        self.cache
            .read()
            .get(&feed.map_key())
            .map(|entry| (entry.reference, entry.payload.clone()))
            .ok_or_else(|| FeedError::NotFound(format!("{:?} has no cached update", feed)))
    }

    /// Epoch of the latest cached update of `feed`.
    pub fn latest_epoch(&self, feed: &Feed) -> Option<Epoch> {
        self.cache.read().get(&feed.map_key()).map(|entry| entry.epoch)
    }

    pub fn cached(&self, feed: &Feed) -> Option<CacheEntry> {
        self.cache.read().get(&feed.map_key()).cloned()
    }

    /// Make `request` the feed's cached latest, or refuse it if the cache
    /// already holds that slot or something newer. Returns the replaced entry.
    fn claim(&self, request: &Request, reference: Reference) -> Result<Option<CacheEntry>> {
        let key = request.feed().map_key();
        let mut cache = self.cache.write();
        if let Some(entry) = cache.get(&key) {
            if entry.epoch.is_same_epoch(request.epoch()) || !entry.is_superseded_by(request) {
                return Err(FeedError::InvalidOperation(format!(
                    "update at {:?} is not newer than known update at {:?}",
                    request.epoch(),
                    entry.epoch
                )));
            }
        }
        Ok(cache.insert(key, CacheEntry::of(request, reference)))
    }

    /// Undo [`Handler::claim`], unless the entry has moved on since.
    fn release(&self, feed: &Feed, reference: Reference, previous: Option<CacheEntry>) {
        let key = feed.map_key();
        let mut cache = self.cache.write();
        if cache.get(&key).map(|entry| entry.reference) != Some(reference) {
            return;
        }
        match previous {
            Some(entry) => {
                cache.insert(key, entry);
            }
            None => {
                cache.remove(&key);
            }
        }
    }

    /// Cache `request` unless a newer update of its feed is already cached.
    fn remember(&self, request: &Request, reference: Reference) {
        let key = request.feed().map_key();
        let mut cache = self.cache.write();
        match cache.get(&key) {
            Some(entry)
                if !entry.is_superseded_by(request)
                    && !entry.epoch.is_same_epoch(request.epoch()) => {}
            _ => {
                cache.insert(key, CacheEntry::of(request, reference));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epochfeed_core::GenericSigner;
    use epochfeed_store::{Loader, MemoryStore, Saver, StoreError};

    fn handler() -> Handler<MemoryStore> {
        Handler::new(MemoryStore::new(), HandlerConfig::default())
    }

    fn signed(signer: &GenericSigner, feed: Feed, epoch: Epoch, time: u64, payload: &[u8]) -> Request {
        let mut request = Request::new(Id::new(feed, epoch), time, payload.to_vec()).unwrap();
        request.sign(signer).unwrap();
        request
    }

    #[tokio::test]
    async fn test_first_request_starts_at_top() {
        let handler = handler();
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("fresh", &[]).unwrap(), signer.address());

        let request = handler.new_request(&Cancellation::new(), &feed).await.unwrap();
        assert_eq!(request.epoch().level, epochfeed_core::HIGHEST_LEVEL);
        assert!(request.payload.is_empty());
        assert!(request.signature.is_none());
    }

    #[tokio::test]
    async fn test_update_caches_latest() {
        let handler = handler();
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("cache", &[]).unwrap(), signer.address());

        let request = signed(&signer, feed, Epoch::first(1_000), 1_000, b"v1");
        let reference = handler.update(&request).await.unwrap();

        assert_eq!(reference, request.id.addr().unwrap());
        assert_eq!(handler.get_content(&feed).unwrap(), (reference, Bytes::from_static(b"v1")));
        assert_eq!(handler.latest_epoch(&feed), Some(Epoch::first(1_000)));
    }

    #[tokio::test]
    async fn test_update_refuses_stale_epoch() {
        let handler = handler();
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("stale", &[]).unwrap(), signer.address());

        let first = signed(&signer, feed, Epoch::first(1_000), 1_000, b"v1");
        handler.update(&first).await.unwrap();

        let same_slot = signed(&signer, feed, Epoch::new(1_001, 25), 1_001, b"again");
        assert!(matches!(
            handler.update(&same_slot).await,
            Err(FeedError::InvalidOperation(_))
        ));

        let older = signed(&signer, feed, Epoch::new(900, 3), 900, b"old");
        assert!(matches!(
            handler.update(&older).await,
            Err(FeedError::InvalidOperation(_))
        ));

        let next = Epoch::next(&Epoch::first(1_000), 1_010);
        handler
            .update(&signed(&signer, feed, next, 1_010, b"v2"))
            .await
            .unwrap();
        assert_eq!(handler.get_content(&feed).unwrap().1, Bytes::from_static(b"v2"));
    }

    #[tokio::test]
    async fn test_update_refuses_unsigned_and_forged() {
        let handler = handler();
        let owner = GenericSigner::generate();
        let feed = Feed::new(Topic::new("forged", &[]).unwrap(), owner.address());

        let unsigned = Request::new(Id::new(feed, Epoch::first(5)), 5, &b"x"[..]).unwrap();
        assert!(matches!(handler.update(&unsigned).await, Err(FeedError::Core(_))));

        let mut forged = unsigned.clone();
        let other = GenericSigner::generate();
        forged.signature = Some(other.sign(&forged.digest().unwrap()).unwrap());
        assert!(matches!(handler.update(&forged).await, Err(FeedError::Core(_))));

        assert!(handler.store().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_fills_cache() {
        let handler = handler();
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("remote", &[]).unwrap(), signer.address());

        // Written behind the handler's back, as another node would.
        let request = signed(&signer, feed, Epoch::first(1_000), 1_000, b"remote");
        let (reference, chunk) = request.to_chunk().unwrap();
        handler.store().save(&reference, &chunk).await.unwrap();

        assert!(handler.get_content(&feed).unwrap_err().is_not_found());

        let outcome = handler
            .lookup(&Cancellation::new(), Query::at(feed, 2_000))
            .await
            .unwrap();
        assert_eq!(outcome.request.time, 1_000);
        assert_eq!(handler.get_content(&feed).unwrap(), (reference, Bytes::from_static(b"remote")));
    }

    #[tokio::test]
    async fn test_historical_lookup_keeps_newer_cache_entry() {
        let handler = handler();
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("history", &[]).unwrap(), signer.address());

        let first = signed(&signer, feed, Epoch::first(1_000), 1_000, b"v1");
        handler.update(&first).await.unwrap();
        let next = Epoch::next(&Epoch::first(1_000), 1_500);
        handler
            .update(&signed(&signer, feed, next, 1_500, b"v2"))
            .await
            .unwrap();

        let outcome = handler
            .lookup(&Cancellation::new(), Query::at(feed, 1_200))
            .await
            .unwrap();
        assert_eq!(&outcome.request.payload[..], b"v1");
        assert_eq!(handler.get_content(&feed).unwrap().1, Bytes::from_static(b"v2"));
    }

    /// Memory store whose saves take a while and can be made to fail.
    #[derive(Default)]
    struct SlowStore {
        inner: MemoryStore,
        failing: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl Loader for SlowStore {
        async fn load(&self, reference: &Reference) -> epochfeed_store::Result<Bytes> {
            self.inner.load(reference).await
        }
    }

    #[async_trait::async_trait]
    impl Saver for SlowStore {
        async fn save(&self, reference: &Reference, content: &[u8]) -> epochfeed_store::Result<()> {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(reference, content).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_one_slot_store_one() {
        let handler = Handler::new(SlowStore::default(), HandlerConfig::default());
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("race", &[]).unwrap(), signer.address());

        let a = signed(&signer, feed, Epoch::first(1_000), 1_000, b"a");
        let b = signed(&signer, feed, Epoch::first(1_000), 1_000, b"b");
        let (ra, rb) = tokio::join!(handler.update(&a), handler.update(&b));

        assert!(ra.is_ok());
        assert!(matches!(rb, Err(FeedError::InvalidOperation(_))));
        assert_eq!(handler.store().inner.len(), 1);
        let stored = handler.store().inner.load(&ra.unwrap()).await.unwrap();
        assert_eq!(stored, Bytes::from(a.to_chunk().unwrap().1));
        assert_eq!(handler.get_content(&feed).unwrap().1, Bytes::from_static(b"a"));
    }

    #[tokio::test]
    async fn test_failed_save_restores_cache() {
        let handler = Handler::new(SlowStore::default(), HandlerConfig::default());
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new("flaky", &[]).unwrap(), signer.address());
        let first = Epoch::first(1_000);

        handler.store().failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let v1 = signed(&signer, feed, first, 1_000, b"v1");
        assert!(matches!(handler.update(&v1).await, Err(FeedError::Store(_))));
        assert!(handler.cached(&feed).is_none());

        handler.store().failing.store(false, std::sync::atomic::Ordering::SeqCst);
        handler.update(&v1).await.unwrap();

        handler.store().failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let v2 = signed(&signer, feed, Epoch::next(&first, 1_010), 1_010, b"v2");
        assert!(handler.update(&v2).await.is_err());
        assert_eq!(handler.get_content(&feed).unwrap().1, Bytes::from_static(b"v1"));
    }
}
