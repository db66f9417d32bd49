//! Hashing and byte helpers shared by every other module.
//!
//! Two hash functions are in play:
//! - Keccak-256 (legacy padding) is the durable one: address checksums,
//!   public-key addresses, update digests and store references.
//! - Blake3 is the fast one, used only for in-memory cache keys through a
//!   pool of reusable hasher states.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Length of a Keccak-256 digest in bytes.
pub const HASH_LENGTH: usize = 32;

/// Upper bound on idle hasher states kept by a [`HasherPool`].
const MAX_IDLE_HASHERS: usize = 64;

/// Compute the Keccak-256 hash of the given data.
pub fn keccak256(data: &[u8]) -> [u8; HASH_LENGTH] {
    Keccak256::digest(data).into()
}

/// Keccak-256 over several slices, as if they were concatenated.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// XOR `a` and `b` into `dst` over their common length.
///
/// Returns the number of bytes written. Bytes of `dst` beyond that are left
/// untouched.
pub fn xor_bytes(dst: &mut [u8], a: &[u8], b: &[u8]) -> usize {
    let n = dst.len().min(a.len()).min(b.len());
    for i in 0..n {
        dst[i] = a[i] ^ b[i];
    }
    n
}

/// A 32-byte digest, typically the input to signing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// Hash arbitrary data with Keccak-256.
    pub fn keccak(data: &[u8]) -> Self {
        Self(keccak256(data))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub const ZERO: Self = Self([0u8; HASH_LENGTH]);
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// A thread-safe pool of reusable Blake3 hasher states.
///
/// States are reset on checkout and handed back when the guard drops, so a
/// panic or early return still returns them. An empty pool simply builds a
/// fresh hasher; results never depend on whether a state was reused.
pub struct HasherPool {
    idle: Mutex<Vec<blake3::Hasher>>,
}

impl HasherPool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            idle: parking_lot::const_mutex(Vec::new()),
        }
    }

    /// Check out a reset hasher.
    pub fn get(&self) -> PooledHasher<'_> {
        let mut hasher = self.idle.lock().pop().unwrap_or_default();
        hasher.reset();
        PooledHasher { pool: self, hasher }
    }

    /// Number of idle states currently held.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn put(&self, hasher: blake3::Hasher) {
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_HASHERS {
            idle.push(hasher);
        }
    }
}

impl Default for HasherPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped checkout from a [`HasherPool`].
pub struct PooledHasher<'a> {
    pool: &'a HasherPool,
    hasher: blake3::Hasher,
}

impl Deref for PooledHasher<'_> {
    type Target = blake3::Hasher;

    fn deref(&self) -> &Self::Target {
        &self.hasher
    }
}

impl DerefMut for PooledHasher<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.hasher
    }
}

impl Drop for PooledHasher<'_> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.hasher));
    }
}
