//! Feed updates: timestamped, signed payloads stored at `Id::addr()`.
//!
//! Chunk layout:
//!
//! ```text
//! header(8)   version byte, then 7 zero bytes
//! id(60)      feed(52) ∥ epoch(8)
//! time(8)     little-endian u64
//! payload     0..=MAX_PAYLOAD_LEN bytes
//! signature   65 bytes, over keccak256 of everything above
//! ```

use bytes::Bytes;

use crate::epoch::Epoch;
use crate::error::{CoreError, Result};
use crate::feed::Feed;
use crate::hash::{keccak256_concat, Hash};
use crate::id::{Id, ID_LENGTH};
use crate::signature::{recover_address, Signature, Signer, SIGNATURE_LENGTH};
use crate::types::Reference;

/// The current update layout version.
pub const UPDATE_VERSION: u8 = 0;

const HEADER_LENGTH: usize = 8;
const TIME_LENGTH: usize = 8;

/// Largest chunk an update may occupy.
const MAX_CHUNK_LEN: usize = 4096;

/// Bytes of an update chunk that are not payload.
const OVERHEAD: usize = HEADER_LENGTH + ID_LENGTH + TIME_LENGTH + SIGNATURE_LENGTH;

/// Largest payload that fits in a single update chunk.
pub const MAX_PAYLOAD_LEN: usize = MAX_CHUNK_LEN - OVERHEAD;

/// A feed update, signed or about to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: Id,
    /// Publisher-claimed time of the update.
    pub time: u64,
    pub payload: Bytes,
    pub signature: Option<Signature>,
}

impl Request {
    /// Create an unsigned update. Fails if the payload does not fit in a chunk.
    pub fn new(id: Id, time: u64, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        check_payload(&payload)?;
        Ok(Self {
            id,
            time,
            payload,
            signature: None,
        })
    }

    /// Replace the payload. Drops any signature, which no longer covers it.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        check_payload(&payload)?;
        self.payload = payload;
        self.signature = None;
        Ok(())
    }

    pub fn feed(&self) -> &Feed {
        &self.id.feed
    }

    pub fn epoch(&self) -> &Epoch {
        &self.id.epoch
    }

    /// Everything covered by the signature.
    fn signed_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(OVERHEAD + self.payload.len());
        buf.push(UPDATE_VERSION);
        buf.extend_from_slice(&[0u8; HEADER_LENGTH - 1]);
        buf.extend_from_slice(&self.id.to_bytes()?);
        buf.extend_from_slice(&self.time.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// The digest that gets signed.
    pub fn digest(&self) -> Result<Hash> {
        let mut header = [0u8; HEADER_LENGTH];
        header[0] = UPDATE_VERSION;
        Ok(Hash(keccak256_concat(&[
            &header,
            &self.id.to_bytes()?,
            &self.time.to_le_bytes(),
            &self.payload,
        ])))
    }

    /// Sign with `signer`, which must own the feed.
    pub fn sign<S: Signer + ?Sized>(&mut self, signer: &S) -> Result<()> {
        if signer.address() != self.id.feed.user {
            return Err(CoreError::InvalidValue(format!(
                "signer {} does not own feed {:?}",
                signer.address(),
                self.id.feed
            )));
        }
        let digest = self.digest()?;
        self.signature = Some(signer.sign(&digest)?);
        Ok(())
    }

    /// Check that the signature recovers to the feed owner.
    pub fn verify(&self) -> Result<()> {
        let signature = self.signature.as_ref().ok_or(CoreError::InvalidSignature)?;
        let signer = recover_address(&self.digest()?, signature)?;
        if signer != self.id.feed.user {
            return Err(CoreError::InvalidSignature);
        }
        Ok(())
    }

    /// Encode as a chunk and the reference it belongs at.
    pub fn to_chunk(&self) -> Result<(Reference, Vec<u8>)> {
        let signature = self.signature.as_ref().ok_or_else(|| {
            CoreError::InvalidValue("cannot encode an unsigned update".into())
        })?;
        check_payload(&self.payload)?;
        let mut data = self.signed_bytes()?;
        data.extend_from_slice(&signature.0);
        Ok((self.id.addr()?, data))
    }

    /// Decode and authenticate a chunk loaded from `reference`.
    ///
    /// Fails if the layout is wrong, if the chunk does not belong at
    /// `reference`, or if the signature does not recover to the feed owner.
    pub fn from_chunk(reference: &Reference, data: &[u8]) -> Result<Self> {
        if data.len() < OVERHEAD {
            return Err(CoreError::InvalidValue(format!(
                "update chunk too short: need at least {} bytes, got {}",
                OVERHEAD,
                data.len()
            )));
        }
        if data.len() > MAX_CHUNK_LEN {
            return Err(CoreError::InvalidValue(format!(
                "update chunk too long: max {} bytes, got {}",
                MAX_CHUNK_LEN,
                data.len()
            )));
        }
        if data[0] != UPDATE_VERSION {
            return Err(CoreError::UnsupportedVersion(data[0]));
        }

        let mut cursor = HEADER_LENGTH;
        let id = Id::binary_get(&data[cursor..cursor + ID_LENGTH])?;
        cursor += ID_LENGTH;

        let mut time = [0u8; TIME_LENGTH];
        time.copy_from_slice(&data[cursor..cursor + TIME_LENGTH]);
        cursor += TIME_LENGTH;

        let sig_start = data.len() - SIGNATURE_LENGTH;
        let payload = Bytes::copy_from_slice(&data[cursor..sig_start]);
        let signature = Signature::try_from(&data[sig_start..])?;

        if id.addr()? != *reference {
            return Err(CoreError::InvalidValue(format!(
                "update for {:?} does not belong at {}",
                id, reference
            )));
        }

        let request = Self {
            id,
            time: u64::from_le_bytes(time),
            payload,
            signature: Some(signature),
        };
        request.verify()?;
        Ok(request)
    }
}

fn check_payload(payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CoreError::InvalidValue(format!(
            "update payload too long: max {} bytes, got {}",
            MAX_PAYLOAD_LEN,
            payload.len()
        )));
    }
    Ok(())
}
