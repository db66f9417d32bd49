//! Golden test vectors for deterministic verification.
//!
//! Each vector pins one derivation to bytes computed independently of this
//! code base. Any change here is a wire-format change.

use serde::Serialize;

use epochfeed_core::{
    Address, Epoch, Feed, GenericSigner, Id, Request, Signer, Topic,
};

/// A golden test vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: VectorKind,
}

/// What a vector pins down.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorKind {
    /// `Topic::new(name, related)` as lowercase hex.
    Topic {
        topic_name: &'static str,
        related_content: &'static str,
        expected: &'static str,
    },
    /// Checksummed text form of an address.
    Checksum {
        address: &'static str,
        expected: &'static str,
    },
    /// Address controlled by a secret key.
    Signer {
        secret: &'static str,
        expected: &'static str,
    },
    /// `Id::addr()` for a feed and epoch.
    IdAddress {
        topic: &'static str,
        user: &'static str,
        time: u64,
        level: u8,
        expected: &'static str,
    },
    /// Digest of an unsigned update.
    UpdateDigest {
        topic: &'static str,
        user: &'static str,
        time: u64,
        level: u8,
        payload: &'static str,
        expected: &'static str,
    },
}

const GOLDEN_TOPIC: &str = "dfa89c750e3108f9c2aeef0123456789abcdef0123456789abcdef0123456789";
const SECRET_ONE_USER: &str = "7e5f4552091a69125d5dfcb7b8c2659029395bdf";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "topic from name and related content",
            kind: VectorKind::Topic {
                topic_name: "test-topic",
                related_content: "abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789",
                expected: GOLDEN_TOPIC,
            },
        },
        GoldenVector {
            name: "checksum mixed case 1",
            kind: VectorKind::Checksum {
                address: "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
                expected: "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            },
        },
        GoldenVector {
            name: "checksum mixed case 2",
            kind: VectorKind::Checksum {
                address: "fb6916095ca1df60bb79ce92ce3ea74c37c5d359",
                expected: "fB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            },
        },
        GoldenVector {
            name: "checksum mixed case 3",
            kind: VectorKind::Checksum {
                address: "dbf03b407c01e7cd3cbea99509d93f8dddc8c6fb",
                expected: "dbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            },
        },
        GoldenVector {
            name: "checksum mixed case 4",
            kind: VectorKind::Checksum {
                address: "d1220a0cf47c7b9be7a2e6ba89f429762e7b9adb",
                expected: "D1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
            },
        },
        GoldenVector {
            name: "secret key one",
            kind: VectorKind::Signer {
                secret: "0000000000000000000000000000000000000000000000000000000000000001",
                expected: "7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
            },
        },
        GoldenVector {
            name: "secret key two",
            kind: VectorKind::Signer {
                secret: "0000000000000000000000000000000000000000000000000000000000000002",
                expected: "2B5AD5c4795c026514f8317c7a215E218DcCD6cF",
            },
        },
        GoldenVector {
            name: "secret key three",
            kind: VectorKind::Signer {
                secret: "0000000000000000000000000000000000000000000000000000000000000003",
                expected: "6813Eb9362372EEF6200f3b1dbC3f819671cBA69",
            },
        },
        GoldenVector {
            name: "id address at top level",
            kind: VectorKind::IdAddress {
                topic: GOLDEN_TOPIC,
                user: SECRET_ONE_USER,
                time: 1_700_000_000,
                level: 25,
                expected: "f961b73ec8bb5d9002ac18af992d8862d1a4470632848a18eb0d04706347b3b6",
            },
        },
        GoldenVector {
            name: "id address at lowest level",
            kind: VectorKind::IdAddress {
                topic: GOLDEN_TOPIC,
                user: SECRET_ONE_USER,
                time: 1_700_000_000,
                level: 0,
                expected: "63b3ecd46631ecca6717cb4fc220c948044762f3c60a780380018c3825f3eb07",
            },
        },
        GoldenVector {
            name: "id address of zero epoch",
            kind: VectorKind::IdAddress {
                topic: GOLDEN_TOPIC,
                user: SECRET_ONE_USER,
                time: 0,
                level: 0,
                expected: "e3b0c2921a4cbefb787f99ac7dfecaa1c2a9d302ecb8ae8d79981f4e95c05275",
            },
        },
        GoldenVector {
            name: "update digest",
            kind: VectorKind::UpdateDigest {
                topic: GOLDEN_TOPIC,
                user: SECRET_ONE_USER,
                time: 1_700_000_000,
                level: 25,
                payload: "68656c6c6f",
                expected: "1becccafb32e9a0221be57651b530024e7daecc5595b94751a9970d0fbd63fb6",
            },
        },
    ]
}

/// All vectors as a JSON array, for other implementations to consume.
pub fn vectors_json() -> String {
    serde_json::to_string_pretty(&all_vectors()).unwrap_or_default()
}

fn feed_of(topic: &str, user: &str) -> Result<Feed, String> {
    let topic = Topic::from_hex(topic).map_err(|e| e.to_string())?;
    let user = Address::from_hex(user).map_err(|e| e.to_string())?;
    Ok(Feed::new(topic, user))
}

/// Recompute what a vector pins down.
pub fn compute(vector: &GoldenVector) -> Result<String, String> {
    match &vector.kind {
        VectorKind::Topic {
            topic_name,
            related_content,
            ..
        } => {
            let related = hex::decode(related_content).map_err(|e| e.to_string())?;
            Topic::new(topic_name, &related)
                .map(|t| t.to_hex())
                .map_err(|e| e.to_string())
        }
        VectorKind::Checksum { address, .. } => Address::from_hex(address)
            .map(|a| a.to_hex())
            .map_err(|e| e.to_string()),
        VectorKind::Signer { secret, .. } => GenericSigner::from_hex(secret)
            .map(|s| s.address().to_hex())
            .map_err(|e| e.to_string()),
        VectorKind::IdAddress {
            topic,
            user,
            time,
            level,
            ..
        } => {
            let id = Id::new(feed_of(topic, user)?, Epoch::new(*time, *level));
            id.addr().map(|r| r.to_hex()).map_err(|e| e.to_string())
        }
        VectorKind::UpdateDigest {
            topic,
            user,
            time,
            level,
            payload,
            ..
        } => {
            let id = Id::new(feed_of(topic, user)?, Epoch::new(*time, *level));
            let payload = hex::decode(payload).map_err(|e| e.to_string())?;
            Request::new(id, *time, payload)
                .and_then(|r| r.digest())
                .map(|d| d.to_hex())
                .map_err(|e| e.to_string())
        }
    }
}

fn expected(vector: &GoldenVector) -> &'static str {
    match &vector.kind {
        VectorKind::Topic { expected, .. }
        | VectorKind::Checksum { expected, .. }
        | VectorKind::Signer { expected, .. }
        | VectorKind::IdAddress { expected, .. }
        | VectorKind::UpdateDigest { expected, .. } => *expected,
    }
}

/// Check every vector; returns `(name, matches, computed or error)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match compute(v) {
            Ok(got) => (v.name.to_string(), got == expected(v), got),
            Err(e) => (v.name.to_string(), false, e),
        })
        .collect()
}
