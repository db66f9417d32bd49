//! The temporal lookup orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use epochfeed_core::{Epoch, Feed, Id, Request, MAX_BASE};
use epochfeed_store::Loader;

use crate::cancel::Cancellation;
use crate::config::LookupConfig;
use crate::error::{LookupError, Result};
use crate::query::Query;
use crate::strategy::{Probe, SearchStrategy};

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    /// The update that was current at the query's time limit.
    pub request: Request,
    /// How many probes the search issued.
    pub reads: u64,
}

/// Current unix time in seconds.
pub fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Find the update of `query.feed` that was current at `query.time_limit`.
///
/// A time limit of zero means "now". The search starts no later than
/// [`LookupConfig::max_clock_skew`] past the local clock, so a limit such as
/// `u64::MAX` reads as "the latest update".
///
/// Missing, undecodable, badly signed and too-recent updates all look the
/// same to the strategy: absent. Only cancellation, probe timeouts and store
/// failures end the search early.
pub async fn lookup<L, A>(
    cancel: &Cancellation,
    store: &L,
    query: &Query,
    config: &LookupConfig,
    strategy: &A,
) -> Result<LookupOutcome>
where
    L: Loader + ?Sized,
    A: SearchStrategy + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(LookupError::Cancelled);
    }

    let clock = now_seconds();
    let time_limit = if query.time_limit == 0 {
        clock
    } else {
        query.time_limit
    };

    // Slots past 56 bits have no address; nothing can be stored there.
    let now = time_limit
        .min(clock.saturating_add(config.max_clock_skew.as_secs()))
        .min(MAX_BASE);

    // The descent assumes the hint is not after the deadline.
    let hint = if query.hint.time > now {
        tracing::debug!(hint = ?query.hint, time_limit, "dropping hint later than time limit");
        Epoch::NO_CLUE
    } else {
        query.hint
    };

    let probe = StoreProbe {
        store,
        cancel,
        feed: query.feed,
        time_limit,
        timeout: config.probe_timeout,
        reads: AtomicU64::new(0),
    };

    let found = strategy
        .search(now, hint, &probe as &dyn Probe<Request>)
        .await;
    let reads = probe.reads.load(Ordering::Acquire);

    match found {
        Ok(Some(request)) => {
            tracing::info!(feed = ?query.feed, reads, time = request.time, "feed lookup finished");
            Ok(LookupOutcome { request, reads })
        }
        Ok(None) => {
            tracing::info!(feed = ?query.feed, reads, "feed lookup found no update");
            Err(LookupError::NotFound)
        }
        Err(e) => {
            tracing::debug!(feed = ?query.feed, reads, error = %e, "feed lookup aborted");
            Err(e)
        }
    }
}

/// Answers probes by loading update chunks from a store.
struct StoreProbe<'a, L: ?Sized> {
    store: &'a L,
    cancel: &'a Cancellation,
    feed: Feed,
    time_limit: u64,
    timeout: Duration,
    reads: AtomicU64,
}

#[async_trait]
impl<'a, L: Loader + ?Sized> Probe<Request> for StoreProbe<'a, L> {
    async fn read(&self, epoch: Epoch, _now: u64) -> Result<Option<Request>> {
        self.reads.fetch_add(1, Ordering::AcqRel);

        if self.cancel.is_cancelled() {
            return Err(LookupError::Cancelled);
        }

        let reference = Id::new(self.feed, epoch).addr()?;

        let loaded = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(LookupError::Cancelled),
            loaded = tokio::time::timeout(self.timeout, self.store.load(&reference)) => loaded,
        };

        let content = match loaded {
            Err(_) => return Err(LookupError::DeadlineExceeded(self.timeout)),
            Ok(Err(e)) if e.is_not_found() => return Ok(None),
            Ok(Err(e)) => {
                tracing::warn!(%reference, error = %e, "store failed during feed lookup");
                return Err(e.into());
            }
            Ok(Ok(content)) => content,
        };

        match Request::from_chunk(&reference, &content) {
            Ok(request) if request.time <= self.time_limit => Ok(Some(request)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::debug!(%reference, error = %e, "ignoring undecodable feed update");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epochfeed_core::{GenericSigner, Signer, Topic};
    use epochfeed_store::{MemoryStore, Saver};

    use crate::strategy::FluxSearch;

    async fn publish(store: &MemoryStore, signer: &GenericSigner, feed: Feed, times: &[u64]) {
        let mut last = Epoch::NO_CLUE;
        for &time in times {
            let epoch = Epoch::next(&last, time);
            let mut request =
                Request::new(Id::new(feed, epoch), time, format!("at {}", time).into_bytes())
                    .unwrap();
            request.sign(signer).unwrap();
            let (reference, chunk) = request.to_chunk().unwrap();
            store.save(&reference, &chunk).await.unwrap();
            last = epoch;
        }
    }

    fn setup() -> (MemoryStore, GenericSigner, Feed) {
        let signer = GenericSigner::generate();
        let feed = Feed::new(Topic::new_truncated("lookup", &[]), signer.address());
        (MemoryStore::new(), signer, feed)
    }

    async fn find(store: &MemoryStore, query: Query) -> Result<LookupOutcome> {
        lookup(
            &Cancellation::new(),
            store,
            &query,
            &LookupConfig::default(),
            &FluxSearch,
        )
        .await
    }

    #[tokio::test]
    async fn test_lookup_at_deadline() {
        let (store, signer, feed) = setup();
        publish(&store, &signer, feed, &[10, 20, 30]).await;

        let outcome = find(&store, Query::at(feed, 25)).await.unwrap();
        assert_eq!(outcome.request.time, 20);
        assert_eq!(&outcome.request.payload[..], b"at 20");
        assert_eq!(outcome.reads, store.loads());

        let outcome = find(&store, Query::at(feed, 35)).await.unwrap();
        assert_eq!(outcome.request.time, 30);

        let err = find(&store, Query::at(feed, 5)).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound));
    }

    #[tokio::test]
    async fn test_unbounded_time_limit_finds_latest() {
        let (store, signer, feed) = setup();
        publish(&store, &signer, feed, &[10, 20, 30]).await;

        for limit in [u64::MAX, 1 << 57, 1 << 56] {
            let outcome = find(&store, Query::at(feed, limit)).await.unwrap();
            assert_eq!(outcome.request.time, 30, "limit {}", limit);
            // One top-level epoch per year back to 1970, then the descent.
            assert!(outcome.reads < 200, "{} reads", outcome.reads);
        }
    }

    #[tokio::test]
    async fn test_clock_skew_bounds_future_updates() {
        let (store, signer, feed) = setup();
        let ahead = now_seconds() + (1 << 26);
        publish(&store, &signer, feed, &[ahead]).await;

        let strict = LookupConfig::default().with_max_clock_skew(Duration::ZERO);
        let err = lookup(&Cancellation::new(), &store, &Query::at(feed, u64::MAX), &strict, &FluxSearch)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NotFound));

        let lenient = LookupConfig::default().with_max_clock_skew(Duration::from_secs(1 << 27));
        let outcome =
            lookup(&Cancellation::new(), &store, &Query::at(feed, u64::MAX), &lenient, &FluxSearch)
                .await
                .unwrap();
        assert_eq!(outcome.request.time, ahead);
    }

    #[tokio::test]
    async fn test_pre_cancelled_issues_no_reads() {
        let (store, signer, feed) = setup();
        publish(&store, &signer, feed, &[10]).await;

        let cancel = Cancellation::new();
        cancel.cancel();
        let err = lookup(&cancel, &store, &Query::at(feed, 20), &LookupConfig::default(), &FluxSearch)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Cancelled));
        assert_eq!(store.loads(), 0);
    }

    #[tokio::test]
    async fn test_foreign_signature_is_absent() {
        let (store, _, feed) = setup();
        let impostor = GenericSigner::generate();

        // Signed by someone else, placed in the owner's slot.
        let epoch = Epoch::first(10);
        let forged_feed = Feed::new(feed.topic, impostor.address());
        let mut request = Request::new(Id::new(forged_feed, epoch), 10, &b"forged"[..]).unwrap();
        request.sign(&impostor).unwrap();
        let (_, chunk) = request.to_chunk().unwrap();
        let target = Id::new(feed, epoch).addr().unwrap();
        store.save(&target, &chunk).await.unwrap();

        let err = find(&store, Query::at(feed, 20)).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound));
    }

    #[tokio::test]
    async fn test_garbage_chunk_is_absent() {
        let (store, _, feed) = setup();
        let target = Id::new(feed, Epoch::first(10)).addr().unwrap();
        store.save(&target, b"not an update").await.unwrap();

        let err = find(&store, Query::at(feed, 20)).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound));
    }

    #[tokio::test]
    async fn test_hint_after_time_limit_is_ignored() {
        let (store, signer, feed) = setup();
        let times = [1_700_000_000, 1_700_000_500, 1_700_003_000];
        publish(&store, &signer, feed, &times).await;

        let mut last = Epoch::NO_CLUE;
        for &time in &times {
            last = Epoch::next(&last, time);
        }

        let outcome = find(&store, Query::at(feed, 1_700_000_600).with_hint(last))
            .await
            .unwrap();
        assert_eq!(outcome.request.time, 1_700_000_500);
    }

    #[tokio::test]
    async fn test_latest_uses_wall_clock() {
        let (store, signer, feed) = setup();
        let now = now_seconds();
        publish(&store, &signer, feed, &[now - 100, now - 50]).await;

        let outcome = find(&store, Query::latest(feed)).await.unwrap();
        assert_eq!(outcome.request.time, now - 50);
    }
}
