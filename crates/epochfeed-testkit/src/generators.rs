//! Proptest generators for property-based testing.

use proptest::prelude::*;

use epochfeed_core::{
    Address, Epoch, Feed, GenericSigner, Id, Request, Signer, Topic, HIGHEST_LEVEL,
    MAX_PAYLOAD_LEN,
};

/// Generate a signer from a random, valid secret key.
pub fn signer() -> impl Strategy<Value = GenericSigner> {
    any::<[u8; 32]>().prop_filter_map("not a valid secp256k1 scalar", |secret| {
        GenericSigner::from_bytes(&secret).ok()
    })
}

/// Generate a random Address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate a random Topic.
pub fn topic() -> impl Strategy<Value = Topic> {
    any::<[u8; 32]>().prop_map(Topic::from_bytes)
}

/// Generate a topic name that round-trips through `Topic::name`.
pub fn topic_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/_-]{0,30}".prop_map(String::from)
}

/// Generate a random Feed.
pub fn feed() -> impl Strategy<Value = Feed> {
    (topic(), address()).prop_map(|(topic, user)| Feed::new(topic, user))
}

/// Generate a plausible unix time in seconds.
pub fn unix_time() -> impl Strategy<Value = u64> {
    1_500_000_000u64..2_000_000_000u64
}

/// Generate an epoch whose base fits the 56-bit wire format.
pub fn epoch() -> impl Strategy<Value = Epoch> {
    (unix_time(), 0..=HIGHEST_LEVEL).prop_map(|(time, level)| Epoch::new(time, level))
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len.min(MAX_PAYLOAD_LEN))
}

/// Parameters for generating a signed update.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub signer: GenericSigner,
    pub topic: Topic,
    pub epoch: Epoch,
    pub time: u64,
    pub payload: Vec<u8>,
}

/// Generate parameters for a signed update.
pub fn request_params() -> impl Strategy<Value = RequestParams> {
    (signer(), topic(), epoch(), payload(512)).prop_map(|(signer, topic, epoch, payload)| {
        RequestParams {
            signer,
            topic,
            time: epoch.time,
            epoch,
            payload,
        }
    })
}

/// Build and sign an update from parameters.
pub fn request_from_params(params: &RequestParams) -> Request {
    let feed = Feed::new(params.topic, params.signer.address());
    let mut request = Request::new(Id::new(feed, params.epoch), params.time, params.payload.clone())
        .unwrap_or_else(|e| panic!("generated payload must fit: {}", e));
    request
        .sign(&params.signer)
        .unwrap_or_else(|e| panic!("signer owns the feed: {}", e));
    request
}
