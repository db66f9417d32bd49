//! # Epochfeed Core
//!
//! Pure primitives for epochfeed: mutable feeds layered over an immutable,
//! content-addressed store.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over identifiers, addresses and signatures.
//!
//! ## Key Types
//!
//! - [`Topic`] - 32-byte subject of a feed, derived from a name and related content
//! - [`Address`] - 20-byte owner identity with a checksummed hex form
//! - [`Feed`] - A (topic, user) pair; the stable identity of an update stream
//! - [`Epoch`] - Coarse time partition used to place updates
//! - [`Id`] - Feed + epoch; deterministically maps to a store [`Reference`]
//! - [`Request`] - A signed, timestamped update stored at `Id::addr()`
//!
//! ## Signatures
//!
//! Updates are signed with recoverable secp256k1 signatures laid out as
//! `r ∥ s ∥ v` with `v = 27 + recovery_id`. See the [`signature`] module.

pub mod address;
pub mod epoch;
pub mod error;
pub mod feed;
pub mod hash;
pub mod id;
pub mod signature;
pub mod topic;
pub mod types;
pub mod update;
pub mod values;

pub use address::{Address, ADDRESS_LENGTH};
pub use epoch::{Epoch, DEFAULT_LEVEL, EPOCH_LENGTH, HIGHEST_LEVEL, LOWEST_LEVEL, MAX_BASE};
pub use error::{CoreError, Result};
pub use feed::{Feed, FEED_LENGTH};
pub use hash::{keccak256, xor_bytes, Hash, HasherPool, HASH_LENGTH};
pub use id::{Id, ID_LENGTH};
pub use signature::{
    address_of, recover, recover_address, GenericSigner, PublicKey, Signature, Signer,
    RECOVERY_ID_OFFSET, SIGNATURE_LENGTH,
};
pub use topic::{Topic, TOPIC_LENGTH};
pub use types::Reference;
pub use update::{Request, MAX_PAYLOAD_LEN, UPDATE_VERSION};
pub use values::Values;
