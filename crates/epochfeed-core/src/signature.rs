//! Recoverable secp256k1 signatures.
//!
//! Signatures are 65 bytes laid out as `r(32) ∥ s(32) ∥ v(1)`, where `v` is
//! the recovery id offset by 27 (`27..=30`), the value compact secp256k1
//! signatures carry in their header byte. Signing always emits that form.
//! Recovery also accepts the compressed-key headers (`31..=34`) and a bare
//! recovery id (`0..=3`). Digests are signed as-is (prehashed), with no
//! message prefix.
//!
//! Recovery reconstructs the signer's public key directly from the recovery
//! id; feeds are authenticated by comparing [`address_of`] of that key with
//! the feed owner.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::address::{Address, ADDRESS_LENGTH};
use crate::error::{CoreError, Result};
use crate::hash::{keccak256, Hash, HASH_LENGTH};

/// Length of a recoverable signature in bytes.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id in the last signature byte.
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// A 65-byte recoverable signature: `r ∥ s ∥ v`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    /// The raw last byte, `27 + recovery_id` for signatures made here.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// The recovery id encoded in `v`, if `v` is in one of the accepted ranges.
    pub fn recovery_id(&self) -> Option<u8> {
        decode_v(self.0[64])
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }

    pub const ZERO: Self = Self([0u8; SIGNATURE_LENGTH]);
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; SIGNATURE_LENGTH]> for Signature {
    fn from(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| CoreError::InvalidSignature)?;
        Ok(Self(arr))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Signature::from_hex(&s).map_err(de::Error::custom)
    }
}

/// A secp256k1 public key recovered from, or used to check, a signature.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// The 65-byte uncompressed SEC1 encoding (`0x04 ∥ x ∥ y`).
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Parse a SEC1 encoded key, compressed or not.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CoreError::InvalidValue("invalid secp256k1 public key".into()))
    }

    /// The owner address of this key.
    pub fn address(&self) -> Address {
        address_of(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &hex::encode(self.to_uncompressed())[..18])
    }
}

/// Signs feed update digests.
///
/// Implementations must be usable from several tasks at once; signing takes
/// `&self` and mutates nothing.
pub trait Signer: Send + Sync {
    /// Sign a 32-byte digest.
    fn sign(&self, digest: &Hash) -> Result<Signature>;

    /// The address the produced signatures recover to.
    fn address(&self) -> Address;
}

/// The default [`Signer`]: a private key held for the signer's lifetime.
#[derive(Clone)]
pub struct GenericSigner {
    key: SigningKey,
    address: Address,
}

impl GenericSigner {
    /// Build a signer around an existing key.
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(&PublicKey(key.verifying_key().clone()));
        Self { key, address }
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        Self::new(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Create from a 32-byte secret scalar.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self> {
        let key = SigningKey::from_slice(secret)
            .map_err(|_| CoreError::InvalidValue("invalid secp256k1 secret key".into()))?;
        Ok(Self::new(key))
    }

    /// Parse a hex-encoded 32-byte secret.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        let secret: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::length("secret key", 32, bytes.len()))?;
        Self::from_bytes(&secret)
    }

    /// The signer's public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.key.verifying_key().clone())
    }
}

impl Signer for GenericSigner {
    fn sign(&self, digest: &Hash) -> Result<Signature> {
        let (sig, recovery_id): (EcdsaSignature, RecoveryId) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| CoreError::InvalidSignature)?;

        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = RECOVERY_ID_OFFSET + recovery_id.to_byte();
        Ok(Signature(out))
    }

    fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Debug for GenericSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericSigner({})", self.address)
    }
}

/// Map a `v` byte to a recovery id: `27..=30`, `31..=34` (compressed-key
/// flag set) or a bare `0..=3`.
fn decode_v(v: u8) -> Option<u8> {
    match v {
        0..=3 => Some(v),
        27..=34 => Some((v - RECOVERY_ID_OFFSET) & !4),
        _ => None,
    }
}

/// Recover the public key that produced `signature` over `digest`.
///
/// Fails with [`CoreError::InvalidSignature`] if the signature is not 65
/// bytes, carries an unknown `v`, or does not recover to a point.
pub fn recover(signature: &[u8], digest: &[u8; HASH_LENGTH]) -> Result<PublicKey> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CoreError::InvalidSignature);
    }
    let recovery_id = decode_v(signature[64])
        .and_then(RecoveryId::from_byte)
        .ok_or(CoreError::InvalidSignature)?;
    let sig = EcdsaSignature::from_slice(&signature[..64]).map_err(|_| CoreError::InvalidSignature)?;
    VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map(PublicKey)
        .map_err(|_| CoreError::InvalidSignature)
}

/// Address of a public key: last 20 bytes of Keccak-256 over the 64-byte
/// uncompressed point (the `0x04` prefix dropped).
pub fn address_of(key: &PublicKey) -> Address {
    let uncompressed = key.to_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut addr = [0u8; ADDRESS_LENGTH];
    addr.copy_from_slice(&hash[HASH_LENGTH - ADDRESS_LENGTH..]);
    Address(addr)
}

/// Recover the address of whoever signed `digest`.
pub fn recover_address(digest: &Hash, signature: &Signature) -> Result<Address> {
    Ok(address_of(&recover(&signature.0, digest.as_bytes())?))
}
