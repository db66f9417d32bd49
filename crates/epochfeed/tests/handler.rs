//! End-to-end feed publishing and lookup through the handler.

use std::sync::Arc;

use bytes::Bytes;
use epochfeed::lookup::LookupError;
use epochfeed::store::{MemoryStore, SqliteStore};
use epochfeed::{
    Cancellation, Epoch, Feed, FeedError, GenericSigner, Handler, HandlerConfig, Query, Signer,
    Topic, Values,
};

fn topic(name: &str) -> Topic {
    Topic::new(name, &[]).unwrap()
}

#[tokio::test]
async fn test_publish_then_lookup_latest() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let handler = Handler::new(MemoryStore::new(), HandlerConfig::default());
    let signer = GenericSigner::generate();
    let cancel = Cancellation::new();

    for payload in ["one", "two", "three"] {
        handler
            .publish(&cancel, &signer, topic("status"), payload.as_bytes().to_vec())
            .await
            .unwrap();
    }

    let feed = Feed::new(topic("status"), signer.address());
    let outcome = handler.lookup(&cancel, Query::latest(feed)).await.unwrap();
    assert_eq!(&outcome.request.payload[..], b"three");
    assert_eq!(handler.get_content(&feed).unwrap().1, Bytes::from_static(b"three"));
}

#[tokio::test]
async fn test_reader_sees_writer_through_shared_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("feeds.db")).unwrap();

    let writer = Handler::new(store.clone(), HandlerConfig::default());
    let reader = Handler::new(store, HandlerConfig::default());
    let signer = GenericSigner::generate();
    let cancel = Cancellation::new();

    writer
        .publish(&cancel, &signer, topic("shared"), &b"hello"[..])
        .await
        .unwrap();

    let feed = Feed::new(topic("shared"), signer.address());
    assert!(reader.get_content(&feed).unwrap_err().is_not_found());

    let outcome = reader.lookup(&cancel, Query::latest(feed)).await.unwrap();
    assert_eq!(&outcome.request.payload[..], b"hello");
    assert_eq!(outcome.request.feed(), &feed);
    assert_eq!(reader.latest_epoch(&feed), Some(*outcome.request.epoch()));
}

#[tokio::test]
async fn test_lookup_on_empty_feed_is_not_found() {
    let handler = Handler::new(MemoryStore::new(), HandlerConfig::default());
    let signer = GenericSigner::generate();
    let feed = Feed::new(topic("silent"), signer.address());

    let err = handler
        .lookup(&Cancellation::new(), Query::latest(feed))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Lookup(LookupError::NotFound)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_cancelled_publish_stores_nothing() {
    let handler = Handler::new(MemoryStore::new(), HandlerConfig::default());
    let signer = GenericSigner::generate();
    let cancel = Cancellation::new();
    cancel.cancel();

    let err = handler
        .publish(&cancel, &signer, topic("never"), &b"x"[..])
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Lookup(LookupError::Cancelled)));
    assert!(handler.store().is_empty());
}

#[tokio::test]
async fn test_oversized_payload_is_rejected() {
    let handler = Handler::new(MemoryStore::new(), HandlerConfig::default());
    let signer = GenericSigner::generate();

    let err = handler
        .publish(
            &Cancellation::new(),
            &signer,
            topic("big"),
            vec![0u8; epochfeed::core::MAX_PAYLOAD_LEN + 1],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Core(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishers_on_distinct_feeds() {
    let handler = Arc::new(Handler::new(MemoryStore::new(), HandlerConfig::default()));

    let mut tasks = Vec::new();
    for i in 0..6 {
        let handler = handler.clone();
        tasks.push(tokio::spawn(async move {
            let signer = GenericSigner::generate();
            let cancel = Cancellation::new();
            let name = format!("sensor-{}", i);
            handler
                .publish(&cancel, &signer, topic(&name), name.clone().into_bytes())
                .await
                .unwrap();
            (Feed::new(topic(&name), signer.address()), name)
        }));
    }

    for task in tasks {
        let (feed, name) = task.await.unwrap();
        let outcome = handler
            .lookup(&Cancellation::new(), Query::latest(feed))
            .await
            .unwrap();
        assert_eq!(outcome.request.payload, Bytes::from(name.into_bytes()));
    }
}

#[tokio::test]
async fn test_feed_travels_as_query_and_json() {
    let signer = GenericSigner::generate();
    let feed = Feed::new(topic("transport"), signer.address());

    let mut values = Values::new();
    Query::latest(feed).append_values(&mut values);
    let parsed = Values::from_query(&values.to_query()).unwrap();
    assert_eq!(Query::from_values(&parsed).unwrap().feed, feed);

    let json = serde_json::to_string(&feed).unwrap();
    let back: Feed = serde_json::from_str(&json).unwrap();
    assert_eq!(back, feed);

    let first = Epoch::first(1_700_000_000);
    let json = serde_json::to_string(&first).unwrap();
    assert_eq!(serde_json::from_str::<Epoch>(&json).unwrap(), first);
}
