//! Block identifiers
//!
//! Blocks before the protobuf generation are identified by their header
//! signature; protobuf blocks by a digest of their unsigned header.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use super::BlockVersion;
use crate::codec::base58;
use crate::constants::{DIGEST_SIZE, MAX_BLOCK_ID_BASE58_LENGTH, SIGNATURE_SIZE};
use crate::crypto::{Digest, Signature};
use crate::error::BlockError;

/// Canonical block identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockId {
    /// Not yet derived; never valid for any version
    #[default]
    Undefined,
    Signature(Signature),
    Digest(Digest),
}

impl BlockId {
    pub fn from_signature(signature: Signature) -> Self {
        BlockId::Signature(signature)
    }

    pub fn from_digest(digest: Digest) -> Self {
        BlockId::Digest(digest)
    }

    /// Parse the base58 text form
    pub fn from_base58(s: &str) -> Result<Self, BlockError> {
        if s.len() > MAX_BLOCK_ID_BASE58_LENGTH {
            return Err(BlockError::InvalidIdSize);
        }
        Self::from_bytes(&base58::decode(s)?)
    }

    /// 64 bytes make a signature ID, 32 bytes a digest ID
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlockError> {
        match bytes.len() {
            SIGNATURE_SIZE => Ok(BlockId::Signature(Signature::from_slice(bytes)?)),
            DIGEST_SIZE => Ok(BlockId::Digest(Digest::from_slice(bytes)?)),
            _ => Err(BlockError::InvalidIdSize),
        }
    }

    /// Whether this ID has the shape the given version requires
    pub fn is_valid(&self, version: BlockVersion) -> bool {
        match self {
            BlockId::Undefined => false,
            BlockId::Signature(_) => version < BlockVersion::Protobuf,
            BlockId::Digest(_) => version >= BlockVersion::Protobuf,
        }
    }

    /// Raw bytes; empty when undefined
    pub fn bytes(&self) -> &[u8] {
        match self {
            BlockId::Undefined => &[],
            BlockId::Signature(sig) => sig.as_bytes(),
            BlockId::Digest(dig) => dig.as_bytes(),
        }
    }

    pub fn is_signature(&self) -> bool {
        matches!(self, BlockId::Signature(_))
    }

    pub fn signature(&self) -> Option<Signature> {
        match self {
            BlockId::Signature(sig) => Some(*sig),
            _ => None,
        }
    }

    /// Abbreviated form for log lines
    pub fn short_string(&self) -> String {
        let full = self.to_string();
        if full.len() <= 12 {
            return full;
        }
        format!("{}..{}", &full[..6], &full[full.len() - 6..])
    }

    /// Write only the ID bytes, without any type marker
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<usize, BlockError> {
        if let BlockId::Undefined = self {
            return Err(BlockError::encoding("undefined BlockID type"));
        }
        w.write_all(self.bytes())?;
        Ok(self.bytes().len())
    }

    /// Read ID bytes from a stream, returning the number of bytes consumed.
    ///
    /// A typed ID reads exactly its own size. An undefined ID reads 32 bytes
    /// and then tries for 32 more: a full 64 bytes make a signature, a stream
    /// that ends early leaves a digest.
    pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<usize, BlockError> {
        match self {
            BlockId::Signature(_) => {
                let mut buf = [0u8; SIGNATURE_SIZE];
                read_id_part(r, &mut buf)?;
                *self = BlockId::Signature(Signature(buf));
                Ok(SIGNATURE_SIZE)
            }
            BlockId::Digest(_) => {
                let mut buf = [0u8; DIGEST_SIZE];
                read_id_part(r, &mut buf)?;
                *self = BlockId::Digest(Digest(buf));
                Ok(DIGEST_SIZE)
            }
            BlockId::Undefined => {
                let mut buf = [0u8; SIGNATURE_SIZE];
                read_id_part(r, &mut buf[..DIGEST_SIZE])?;
                let second = read_full(r, &mut buf[DIGEST_SIZE..])?;
                if second < DIGEST_SIZE {
                    let mut dig = [0u8; DIGEST_SIZE];
                    dig.copy_from_slice(&buf[..DIGEST_SIZE]);
                    *self = BlockId::Digest(Digest(dig));
                    return Ok(DIGEST_SIZE + second);
                }
                *self = BlockId::Signature(Signature(buf));
                Ok(SIGNATURE_SIZE)
            }
        }
    }
}

/// Fill `buf` or fail with a size error carrying the EOF cause
fn read_id_part<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), BlockError> {
    let n = read_full(r, buf)?;
    if n == buf.len() {
        return Ok(());
    }
    Err(BlockError::TruncatedId(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read {} of {} bytes", n, buf.len()),
    )))
}

/// Read until `buf` is full or the stream ends
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, BlockError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BlockError::Io(e)),
        }
    }
    Ok(filled)
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(self.bytes()))
    }
}

impl FromStr for BlockId {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockId::from_base58(s)
    }
}

impl From<Signature> for BlockId {
    fn from(signature: Signature) -> Self {
        BlockId::Signature(signature)
    }
}

impl From<Digest> for BlockId {
    fn from(digest: Digest) -> Self {
        BlockId::Digest(digest)
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = base58::decode(&s).map_err(serde::de::Error::custom)?;
        BlockId::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::fast_hash;

    fn sig_id() -> BlockId {
        let mut raw = [0u8; 64];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        BlockId::from_signature(Signature(raw))
    }

    fn digest_id() -> BlockId {
        BlockId::from_digest(fast_hash(b"block"))
    }

    #[test]
    fn test_validity_by_version() {
        for v in [
            BlockVersion::Genesis,
            BlockVersion::Plain,
            BlockVersion::Ng,
            BlockVersion::Reward,
        ] {
            assert!(sig_id().is_valid(v));
            assert!(!digest_id().is_valid(v));
            assert!(!BlockId::Undefined.is_valid(v));
        }
        assert!(digest_id().is_valid(BlockVersion::Protobuf));
        assert!(!sig_id().is_valid(BlockVersion::Protobuf));
        assert!(!BlockId::Undefined.is_valid(BlockVersion::Protobuf));
    }

    #[test]
    fn test_base58_roundtrip() {
        for id in [sig_id(), digest_id()] {
            let parsed: BlockId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
    }

    #[test]
    fn test_base58_length_gate() {
        let too_long = "1".repeat(MAX_BLOCK_ID_BASE58_LENGTH + 1);
        assert!(matches!(BlockId::from_base58(&too_long), Err(BlockError::InvalidIdSize)));
        // not base58 at all, but rejected for its length before decoding
        let garbage = "0".repeat(MAX_BLOCK_ID_BASE58_LENGTH + 1);
        assert!(matches!(BlockId::from_base58(&garbage), Err(BlockError::InvalidIdSize)));
    }

    #[test]
    fn test_from_bytes_sizes() {
        assert!(matches!(BlockId::from_bytes(&[0u8; 64]).unwrap(), BlockId::Signature(_)));
        assert!(matches!(BlockId::from_bytes(&[0u8; 32]).unwrap(), BlockId::Digest(_)));
        for len in [0usize, 31, 33, 63, 65] {
            assert!(BlockId::from_bytes(&vec![0u8; len]).unwrap_err().is_invalid_size());
        }
    }

    #[test]
    fn test_undefined_bytes_empty() {
        assert!(BlockId::Undefined.bytes().is_empty());
        assert_eq!(BlockId::Undefined.to_string(), "");
        assert!(BlockId::Undefined.write_to(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_untyped_read_of_64_bytes_is_signature() {
        let raw = sig_id().bytes().to_vec();
        let mut id = BlockId::Undefined;
        let n = id.read_from(&mut raw.as_slice()).unwrap();
        assert_eq!(n, 64);
        assert_eq!(id, sig_id());
    }

    #[test]
    fn test_untyped_read_of_32_bytes_is_digest() {
        let raw = digest_id().bytes().to_vec();
        let mut id = BlockId::Undefined;
        assert_eq!(id.read_from(&mut raw.as_slice()).unwrap(), 32);
        assert_eq!(id, digest_id());
    }

    #[test]
    fn test_untyped_read_with_partial_second_half_is_digest() {
        let mut raw = digest_id().bytes().to_vec();
        raw.extend_from_slice(&[9u8; 10]);
        let mut id = BlockId::Undefined;
        assert_eq!(id.read_from(&mut raw.as_slice()).unwrap(), 42);
        assert_eq!(id, digest_id());
    }

    #[test]
    fn test_truncated_reads_are_size_errors() {
        let mut id = BlockId::Undefined;
        let err = id.read_from(&mut [1u8; 31].as_slice()).unwrap_err();
        assert!(err.is_invalid_size());

        let mut typed = sig_id();
        let err = typed.read_from(&mut [1u8; 40].as_slice()).unwrap_err();
        assert!(matches!(err, BlockError::TruncatedId(_)));
    }

    #[test]
    fn test_typed_read_takes_exact_size() {
        let mut raw = digest_id().bytes().to_vec();
        raw.extend_from_slice(&[7u8; 32]);
        let mut reader = raw.as_slice();
        let mut id = BlockId::Digest(Digest::zero());
        assert_eq!(id.read_from(&mut reader).unwrap(), 32);
        assert_eq!(id, digest_id());
        assert_eq!(reader.len(), 32);
    }

    #[test]
    fn test_write_then_read() {
        let mut out = Vec::new();
        assert_eq!(sig_id().write_to(&mut out).unwrap(), 64);
        let mut id = BlockId::Undefined;
        id.read_from(&mut out.as_slice()).unwrap();
        assert_eq!(id, sig_id());
    }

    #[test]
    fn test_json() {
        let id = digest_id();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        assert_eq!(serde_json::from_str::<BlockId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<BlockId>("\"abc\"").is_err());
    }

    #[test]
    fn test_short_string() {
        let short = sig_id().short_string();
        assert!(short.contains(".."));
        assert_eq!(short.len(), 14);
    }
}
