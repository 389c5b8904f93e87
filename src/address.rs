//! Account addresses
//!
//! Address = version byte || scheme byte || BLAKE3(pubkey)[0:20] || checksum[0:4]

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::codec::base58;
use crate::crypto::{fast_hash, PublicKey};
use crate::error::BlockError;
use crate::Scheme;

pub const ADDRESS_SIZE: usize = 26;
const ADDRESS_VERSION: u8 = 1;
const BODY_SIZE: usize = 22;

/// 26-byte account address bound to one chain scheme
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Derive the address of a public key on the given chain
    pub fn from_public_key(scheme: Scheme, public_key: &PublicKey) -> Self {
        let key_hash = fast_hash(&public_key.0);
        let mut out = [0u8; ADDRESS_SIZE];
        out[0] = ADDRESS_VERSION;
        out[1] = scheme;
        out[2..BODY_SIZE].copy_from_slice(&key_hash.0[..20]);
        let checksum = fast_hash(&out[..BODY_SIZE]);
        out[BODY_SIZE..].copy_from_slice(&checksum.0[..4]);
        Address(out)
    }

    /// Parse and validate raw address bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlockError> {
        let arr: [u8; ADDRESS_SIZE] = bytes
            .try_into()
            .map_err(|_| BlockError::InvalidAddress(format!("invalid length {}", bytes.len())))?;
        if arr[0] != ADDRESS_VERSION {
            return Err(BlockError::InvalidAddress(format!("unsupported version {}", arr[0])));
        }
        let checksum = fast_hash(&arr[..BODY_SIZE]);
        if arr[BODY_SIZE..] != checksum.0[..4] {
            return Err(BlockError::InvalidAddress("checksum mismatch".to_string()));
        }
        Ok(Address(arr))
    }

    /// Chain scheme this address belongs to
    pub fn scheme(&self) -> Scheme {
        self.0[1]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.0))
    }
}

impl FromStr for Address {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_bytes(&base58::decode(s)?)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAIN_NET_SCHEME, TEST_NET_SCHEME};
    use crate::crypto::SecretKey;

    #[test]
    fn test_address_generation() {
        let public = SecretKey::generate().public_key();
        let address = Address::from_public_key(MAIN_NET_SCHEME, &public);
        assert_eq!(address.scheme(), MAIN_NET_SCHEME);
        assert_eq!(Address::from_bytes(address.as_bytes()).unwrap(), address);
    }

    #[test]
    fn test_scheme_changes_address() {
        let public = SecretKey::generate().public_key();
        assert_ne!(
            Address::from_public_key(MAIN_NET_SCHEME, &public),
            Address::from_public_key(TEST_NET_SCHEME, &public)
        );
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let public = SecretKey::generate().public_key();
        let mut bytes = *Address::from_public_key(MAIN_NET_SCHEME, &public).as_bytes();
        bytes[25] ^= 0xff;
        assert!(matches!(Address::from_bytes(&bytes), Err(BlockError::InvalidAddress(_))));
    }

    #[test]
    fn test_string_roundtrip() {
        let public_key = SecretKey::generate().public_key();
        let address = Address::from_public_key(TEST_NET_SCHEME, &public_key);
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
    }
}
