//! ROHO (RH) Block Layer
//!
//! Block representation, wire codecs and identity for the RH chain.
//!
//! Blocks exist in two incompatible wire formats: the legacy fixed-layout
//! binary format (versions 1-4) and the protobuf format (version 5 onward).
//! This crate decodes and encodes both bit-exactly, derives block IDs and
//! checks block signatures and transaction roots.

pub mod address;
pub mod block;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod protobuf;
pub mod transaction;

pub use address::Address;
pub use block::*;
pub use error::BlockError;
pub use transaction::{Transaction, Transactions};

/// Chain identifier byte, mixed into addresses and protobuf messages
pub type Scheme = u8;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    use crate::Scheme;

    /// Main network scheme byte
    pub const MAIN_NET_SCHEME: Scheme = b'R';

    /// Test network scheme byte
    pub const TEST_NET_SCHEME: Scheme = b'T';

    /// Stage network scheme byte
    pub const STAGE_NET_SCHEME: Scheme = b'S';

    /// Size of a BLAKE3 digest
    pub const DIGEST_SIZE: usize = 32;

    /// Size of an x-only Schnorr public key
    pub const PUBLIC_KEY_SIZE: usize = 32;

    /// Size of a Schnorr signature
    pub const SIGNATURE_SIZE: usize = 64;

    /// Generation signature size in the legacy binary format
    pub const GENERATION_SIGNATURE_SIZE: usize = 32;

    /// A base58 encoded signature takes at most ceil(64 * log2(256) / log2(58)) = 88 characters
    pub const MAX_BLOCK_ID_BASE58_LENGTH: usize = 88;

    /// Reward vote of blocks that predate reward voting
    pub const DEFAULT_REWARD_VOTE: i64 = -1;

    /// Maximum size of a transfer attachment
    pub const MAX_ATTACHMENT_SIZE: usize = 140;
}
