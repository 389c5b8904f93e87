//! Error types for the block layer

use std::io;

use thiserror::Error;

use crate::block::WireFormat;
use crate::crypto::CryptoError;

/// Errors produced while encoding, decoding or verifying blocks
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("invalid data size for BlockID")]
    InvalidIdSize,
    #[error("invalid data size for BlockID: {0}")]
    TruncatedId(#[source] io::Error),
    #[error("invalid data size")]
    InvalidDataSize,
    #[error("transaction block length {0} is too small")]
    TransactionBlockTooSmall(u32),
    #[error("{format} format is not defined for block version {version}")]
    UnsupportedVersion { version: u8, format: WireFormat },
    #[error("unknown block version {0}")]
    UnknownVersion(u8),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
    #[error("protobuf decode error: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),
    #[error("protobuf encode error: {0}")]
    ProtobufEncode(#[from] prost::EncodeError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("content error: {0}")]
    Content(String),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BlockError {
    /// True for both forms of a malformed BlockID length
    pub fn is_invalid_size(&self) -> bool {
        matches!(self, BlockError::InvalidIdSize | BlockError::TruncatedId(_))
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        BlockError::Encoding(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_truncated_id_keeps_io_source() {
        let err = BlockError::TruncatedId(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(err.is_invalid_size());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_unsupported_version_message() {
        let err = BlockError::UnsupportedVersion { version: 5, format: WireFormat::Binary };
        assert_eq!(err.to_string(), "binary format is not defined for block version 5");
    }
}
