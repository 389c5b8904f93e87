//! BLAKE3 hashing implementation
//!
//! All hashing in RH uses BLAKE3 for its speed and security.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::CryptoError;
use crate::codec::base58;
use crate::constants::DIGEST_SIZE;

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest(pub [u8; DIGEST_SIZE]);

impl Digest {
    /// The all-zero digest
    pub const fn zero() -> Self {
        Digest([0u8; DIGEST_SIZE])
    }

    /// Create a digest from a slice that must be exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        bytes
            .try_into()
            .map(Digest)
            .map_err(|_| CryptoError::InvalidLength { expected: DIGEST_SIZE, actual: bytes.len() })
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        base58::encode(&self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        base58::fixed::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        base58::fixed::deserialize(deserializer).map(Digest)
    }
}

/// Hash arbitrary bytes using BLAKE3
pub fn fast_hash(data: &[u8]) -> Digest {
    Digest(*blake3::hash(data).as_bytes())
}

/// Hash the concatenation of several parts without an intermediate copy
pub fn fast_hash_parts(parts: &[&[u8]]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Digest(*hasher.finalize().as_bytes())
}
