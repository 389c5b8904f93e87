//! Schnorr signature implementation
//!
//! Uses the secp256k1 curve with BIP-340 Schnorr signatures for block and
//! transaction signing.

use k256::schnorr::signature::{Signer, Verifier};
use k256::schnorr::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::codec::base58;
use crate::constants::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

/// Signature and key errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// 32-byte secret key
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// 32-byte public key (x-only for Schnorr)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

/// 64-byte Schnorr signature
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

impl SecretKey {
    /// Generate a new random secret key
    pub fn generate() -> Self {
        SecretKey(SigningKey::random(&mut OsRng))
    }

    /// Create from 32 bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        SigningKey::from_bytes(bytes)
            .map(SecretKey)
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(&self.0.verifying_key().to_bytes());
        PublicKey(out)
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }
}

impl PublicKey {
    /// Create from a slice, validating that it is a curve point
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: PUBLIC_KEY_SIZE,
            actual: bytes.len(),
        })?;
        VerifyingKey::from_bytes(&arr).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(PublicKey(arr))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl Signature {
    /// Create from a slice that must be exactly 64 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        bytes
            .try_into()
            .map(Signature)
            .map_err(|_| CryptoError::InvalidLength {
                expected: SIGNATURE_SIZE,
                actual: bytes.len(),
            })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        base58::encode(&self.0)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature([0u8; SIGNATURE_SIZE])
    }
}

/// Sign a message
pub fn sign(secret: &SecretKey, message: &[u8]) -> Result<Signature, CryptoError> {
    let signature: k256::schnorr::Signature = secret
        .0
        .try_sign(message)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    Ok(Signature(signature.to_bytes()))
}

/// Verify a signature over a message
pub fn verify(public_key: &PublicKey, signature: &Signature, message: &[u8]) -> bool {
    let verifying_key = match VerifyingKey::from_bytes(&public_key.0) {
        Ok(vk) => vk,
        Err(_) => return false,
    };

    let sig = match k256::schnorr::Signature::try_from(signature.0.as_slice()) {
        Ok(s) => s,
        Err(_) => return false,
    };

    verifying_key.verify(message, &sig).is_ok()
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base58::encode(&self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        base58::fixed::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        base58::fixed::deserialize(deserializer).map(PublicKey)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        base58::fixed::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        base58::fixed::deserialize(deserializer).map(Signature)
    }
}
