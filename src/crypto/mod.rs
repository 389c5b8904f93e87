//! Cryptography module - BLAKE3 hashing, Schnorr signatures, Merkle trees

mod hash;
mod keys;
mod merkle;

pub use hash::*;
pub use keys::*;
pub use merkle::*;
