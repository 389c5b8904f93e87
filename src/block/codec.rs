//! Format-polymorphic block codecs
//!
//! Each block version maps to exactly one codec. Asking a codec to handle
//! a version of the other format fails with `UnsupportedVersion`; nothing
//! is ever converted between formats implicitly.

use super::{binary, proto, Block, BlockHeader, WireFormat};
use crate::error::BlockError;
use crate::Scheme;

/// Leading byte of every protobuf block: field 1 (header), length-delimited
const PROTOBUF_BLOCK_TAG: u8 = 0x0A;

/// Encoding and decoding of blocks and headers in one wire format
pub trait BlockCodec: Send + Sync {
    fn format(&self) -> WireFormat;

    fn marshal_header(&self, header: &BlockHeader, scheme: Scheme) -> Result<Vec<u8>, BlockError>;

    fn unmarshal_header(&self, data: &[u8], scheme: Scheme) -> Result<BlockHeader, BlockError>;

    fn marshal_block(&self, block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError>;

    fn unmarshal_block(&self, data: &[u8], scheme: Scheme) -> Result<Block, BlockError>;

    /// Bytes covered by the block signature
    fn signing_payload(&self, block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError>;
}

/// Fixed-layout format of versions 1-4
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

/// Protobuf format of version 5 onward
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

impl BlockCodec for BinaryCodec {
    fn format(&self) -> WireFormat {
        WireFormat::Binary
    }

    fn marshal_header(&self, header: &BlockHeader, _scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        binary::marshal_header(header)
    }

    fn unmarshal_header(&self, data: &[u8], scheme: Scheme) -> Result<BlockHeader, BlockError> {
        binary::unmarshal_header(data, scheme)
    }

    fn marshal_block(&self, block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        binary::marshal_block(block, scheme)
    }

    fn unmarshal_block(&self, data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
        binary::unmarshal_block(data, scheme)
    }

    /// The whole block up to, not including, the signature
    fn signing_payload(&self, block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        binary::signing_payload(block, scheme)
    }
}

impl BlockCodec for ProtobufCodec {
    fn format(&self) -> WireFormat {
        WireFormat::Protobuf
    }

    fn marshal_header(&self, header: &BlockHeader, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        proto::marshal_header(header, scheme)
    }

    fn unmarshal_header(&self, data: &[u8], scheme: Scheme) -> Result<BlockHeader, BlockError> {
        proto::unmarshal_header(data, scheme)
    }

    fn marshal_block(&self, block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        proto::marshal_block(block, scheme)
    }

    fn unmarshal_block(&self, data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
        proto::unmarshal_block(data, scheme)
    }

    /// The unsigned header message; transactions are covered by the root
    fn signing_payload(&self, block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        proto::marshal_header_without_signature(&block.header, scheme)
    }
}

static BINARY: BinaryCodec = BinaryCodec;
static PROTOBUF: ProtobufCodec = ProtobufCodec;

pub fn codec_for(format: WireFormat) -> &'static dyn BlockCodec {
    match format {
        WireFormat::Binary => &BINARY,
        WireFormat::Protobuf => &PROTOBUF,
    }
}

/// Pick the codec for encoded block bytes by their first byte
pub fn detect_codec(data: &[u8]) -> Result<&'static dyn BlockCodec, BlockError> {
    match data.first() {
        None => Err(BlockError::InvalidDataSize),
        Some(&PROTOBUF_BLOCK_TAG) => Ok(codec_for(WireFormat::Protobuf)),
        Some(_) => Ok(codec_for(WireFormat::Binary)),
    }
}
