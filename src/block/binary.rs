//! Legacy fixed-layout binary format, block versions 1 through 4
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! version u8 | timestamp u64 | parent signature [64] | consensus length u32 (= 40)
//! base target u64 | generation signature [32] | transaction block length u32
//! transaction count (u8 before Ng, u32 from Ng) | transactions
//! [Ng+] features count u32 | features i16...
//! [Reward+] reward vote i64
//! generator public key [32] | block signature [64]
//! ```
//!
//! The header-only form is the same with the transactions left out.

use bytes::BufMut;

use super::{Block, BlockHeader, BlockId, BlockVersion, NxtConsensus, WireFormat};
use crate::codec::{with_buffer, ByteReader};
use crate::constants::{
    DEFAULT_REWARD_VOTE, GENERATION_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};
use crate::crypto::{PublicKey, Signature};
use crate::error::BlockError;
use crate::transaction::Transactions;
use crate::Scheme;

/// Bytes from the version through the transaction block length
const PREFIX_SIZE: usize = 1 + 8 + SIGNATURE_SIZE + 4 + 8 + GENERATION_SIGNATURE_SIZE + 4;
/// Generator key and block signature closing every block
const TAIL_SIZE: usize = PUBLIC_KEY_SIZE + SIGNATURE_SIZE;
/// Consensus block length: base target plus generation signature
const CONSENSUS_BLOCK_LENGTH: u32 = (8 + GENERATION_SIGNATURE_SIZE) as u32;

/// Size of the transaction count field for a version
fn count_field_size(version: BlockVersion) -> usize {
    if version >= BlockVersion::Ng {
        4
    } else {
        1
    }
}

/// Transaction block length a binary block with these transactions carries
pub(crate) fn transaction_block_length(
    version: BlockVersion,
    transactions: &Transactions,
) -> Result<u32, BlockError> {
    let len = transactions.binary_size() + count_field_size(version);
    u32::try_from(len).map_err(|_| BlockError::encoding("transaction block too large"))
}

fn check_binary_version(version: BlockVersion) -> Result<(), BlockError> {
    if version.wire_format() != WireFormat::Binary {
        return Err(BlockError::UnsupportedVersion {
            version: version.as_u8(),
            format: WireFormat::Binary,
        });
    }
    Ok(())
}

/// Reject headers holding data the binary layout cannot represent
fn check_binary_header(header: &BlockHeader) -> Result<(), BlockError> {
    check_binary_version(header.version)?;
    if !header.parent.is_signature() {
        return Err(BlockError::encoding(
            "binary blocks must reference a signature-identified parent",
        ));
    }
    if header.nxt_consensus.generation_signature.len() != GENERATION_SIGNATURE_SIZE {
        return Err(BlockError::encoding(format!(
            "generation signature must be {} bytes, got {}",
            GENERATION_SIGNATURE_SIZE,
            header.nxt_consensus.generation_signature.len()
        )));
    }
    if header.version < BlockVersion::Ng && !header.features.is_empty() {
        return Err(BlockError::encoding("feature votes require block version 3 or later"));
    }
    if header.version < BlockVersion::Reward && header.reward_vote != DEFAULT_REWARD_VOTE {
        return Err(BlockError::encoding("reward vote requires block version 4 or later"));
    }
    if header.state_hash.is_some()
        || header.challenged_header.is_some()
        || !header.transactions_root.is_empty()
    {
        return Err(BlockError::encoding(
            "binary blocks carry no state hash, challenge or transactions root",
        ));
    }
    Ok(())
}

fn put_prefix(header: &BlockHeader, buf: &mut impl BufMut) {
    buf.put_u8(header.version.as_u8());
    buf.put_u64(header.timestamp);
    buf.put_slice(header.parent.bytes());
    buf.put_u32(CONSENSUS_BLOCK_LENGTH);
    buf.put_u64(header.nxt_consensus.base_target);
    buf.put_slice(&header.nxt_consensus.generation_signature);
    buf.put_u32(header.transaction_block_length);
}

fn put_count(version: BlockVersion, count: u32, buf: &mut impl BufMut) -> Result<(), BlockError> {
    if version >= BlockVersion::Ng {
        buf.put_u32(count);
    } else {
        let count = u8::try_from(count).map_err(|_| {
            BlockError::encoding(format!(
                "{} transactions do not fit a version {} block",
                count, version
            ))
        })?;
        buf.put_u8(count);
    }
    Ok(())
}

fn put_votes(header: &BlockHeader, buf: &mut impl BufMut) -> Result<(), BlockError> {
    if header.version >= BlockVersion::Ng {
        let count = u32::try_from(header.features.len())
            .map_err(|_| BlockError::encoding("too many feature votes"))?;
        buf.put_u32(count);
        for feature in &header.features {
            buf.put_i16(*feature);
        }
    }
    if header.version >= BlockVersion::Reward {
        buf.put_i64(header.reward_vote);
    }
    Ok(())
}

pub(crate) fn marshal_header(header: &BlockHeader) -> Result<Vec<u8>, BlockError> {
    check_binary_header(header)?;
    with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
        put_prefix(header, buf);
        put_count(header.version, header.transaction_count, buf)?;
        put_votes(header, buf)?;
        buf.put_slice(header.generator.as_bytes());
        buf.put_slice(header.block_signature.as_bytes());
        Ok(buf.to_vec())
    })
}

fn put_block_without_signature(
    block: &Block,
    scheme: Scheme,
    buf: &mut impl BufMut,
) -> Result<(), BlockError> {
    let header = &block.header;
    check_binary_header(header)?;
    if header.transaction_count as usize != block.transactions.count() {
        return Err(BlockError::Content(format!(
            "header counts {} transactions, block holds {}",
            header.transaction_count,
            block.transactions.count()
        )));
    }
    let expected = transaction_block_length(header.version, &block.transactions)?;
    if header.transaction_block_length != expected {
        return Err(BlockError::Content(format!(
            "transaction block length {} does not match the {} bytes of transactions",
            header.transaction_block_length, expected
        )));
    }
    put_prefix(header, buf);
    put_count(header.version, header.transaction_count, buf)?;
    block.transactions.put_binary(buf, scheme)?;
    put_votes(header, buf)?;
    buf.put_slice(header.generator.as_bytes());
    Ok(())
}

pub(crate) fn marshal_block(block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
    with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
        put_block_without_signature(block, scheme, buf)?;
        buf.put_slice(block.header.block_signature.as_bytes());
        Ok(buf.to_vec())
    })
}

/// Every byte of the block except the trailing signature
pub(crate) fn signing_payload(block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
    with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
        put_block_without_signature(block, scheme, buf)?;
        Ok(buf.to_vec())
    })
}

struct Prefix {
    version: BlockVersion,
    timestamp: u64,
    parent: BlockId,
    nxt_consensus: NxtConsensus,
    transaction_block_length: u32,
}

fn read_prefix(reader: &mut ByteReader<'_>) -> Result<Prefix, BlockError> {
    let version = BlockVersion::try_from(reader.read_u8()?)?;
    check_binary_version(version)?;
    let timestamp = reader.read_u64()?;
    let parent = BlockId::Signature(Signature(reader.read_array()?));
    if reader.read_u32()? != CONSENSUS_BLOCK_LENGTH {
        return Err(BlockError::InvalidDataSize);
    }
    let base_target = reader.read_u64()?;
    let generation_signature = reader.take(GENERATION_SIGNATURE_SIZE)?.to_vec();
    let transaction_block_length = reader.read_u32()?;
    let min_length = count_field_size(version) as u32;
    if transaction_block_length < min_length {
        return Err(BlockError::TransactionBlockTooSmall(transaction_block_length));
    }
    Ok(Prefix {
        version,
        timestamp,
        parent,
        nxt_consensus: NxtConsensus::new(base_target, generation_signature),
        transaction_block_length,
    })
}

fn read_count(version: BlockVersion, reader: &mut ByteReader<'_>) -> Result<u32, BlockError> {
    if version >= BlockVersion::Ng {
        reader.read_u32()
    } else {
        Ok(u32::from(reader.read_u8()?))
    }
}

/// Feature votes and reward vote, as present for the version
fn read_votes(
    version: BlockVersion,
    reader: &mut ByteReader<'_>,
) -> Result<(Vec<i16>, i64), BlockError> {
    let mut features = Vec::new();
    if version >= BlockVersion::Ng {
        let count = reader.read_u32()? as usize;
        if count.checked_mul(2).map_or(true, |size| size > reader.remaining()) {
            return Err(BlockError::InvalidDataSize);
        }
        features.reserve(count);
        for _ in 0..count {
            features.push(reader.read_i16()?);
        }
    }
    let reward_vote = if version >= BlockVersion::Reward {
        reader.read_i64()?
    } else {
        DEFAULT_REWARD_VOTE
    };
    Ok((features, reward_vote))
}

fn assemble_header(
    prefix: Prefix,
    transaction_count: u32,
    (features, reward_vote): (Vec<i16>, i64),
    reader: &mut ByteReader<'_>,
    scheme: Scheme,
) -> Result<BlockHeader, BlockError> {
    let generator = PublicKey(reader.read_array()?);
    let block_signature = Signature(reader.read_array()?);
    reader.finish()?;
    let mut header = BlockHeader {
        version: prefix.version,
        timestamp: prefix.timestamp,
        parent: prefix.parent,
        features,
        reward_vote,
        nxt_consensus: prefix.nxt_consensus,
        transaction_block_length: prefix.transaction_block_length,
        transaction_count,
        generator,
        block_signature,
        transactions_root: Vec::new(),
        state_hash: None,
        challenged_header: None,
        id: BlockId::Undefined,
    };
    header.generate_block_id(scheme)?;
    Ok(header)
}

pub(crate) fn unmarshal_header(data: &[u8], scheme: Scheme) -> Result<BlockHeader, BlockError> {
    let mut reader = ByteReader::new(data);
    let prefix = read_prefix(&mut reader)?;
    let count = read_count(prefix.version, &mut reader)?;
    let votes = read_votes(prefix.version, &mut reader)?;
    assemble_header(prefix, count, votes, &mut reader, scheme)
}

pub(crate) fn unmarshal_block(data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
    let mut reader = ByteReader::new(data);
    let prefix = read_prefix(&mut reader)?;
    let count = read_count(prefix.version, &mut reader)?;
    let tx_block_size = prefix.transaction_block_length as usize - count_field_size(prefix.version);
    let tx_bytes = reader.take(tx_block_size)?;
    let transactions = Transactions::from_binary(tx_bytes, count as usize, scheme)?;
    if transactions.binary_size() != tx_bytes.len() {
        return Err(BlockError::InvalidDataSize);
    }
    let votes = read_votes(prefix.version, &mut reader)?;
    let header = assemble_header(prefix, count, votes, &mut reader, scheme)?;
    Ok(Block { header, transactions })
}

/// Splice raw binary transactions into a binary header, producing the
/// bytes of the full block
pub fn append_header_bytes_to_transactions(
    header_bytes: &[u8],
    transactions: &[u8],
) -> Result<Vec<u8>, BlockError> {
    let first = *header_bytes.first().ok_or(BlockError::InvalidDataSize)?;
    let version = BlockVersion::try_from(first)?;
    check_binary_version(version)?;
    let split = PREFIX_SIZE + count_field_size(version);
    if header_bytes.len() < split + TAIL_SIZE {
        return Err(BlockError::InvalidDataSize);
    }
    let mut out = Vec::with_capacity(header_bytes.len() + transactions.len());
    out.extend_from_slice(&header_bytes[..split]);
    out.extend_from_slice(transactions);
    out.extend_from_slice(&header_bytes[split..]);
    Ok(out)
}

/// Signature from the last 64 bytes of a binary block
pub fn block_signature_from_bytes(data: &[u8]) -> Result<Signature, BlockError> {
    let start = data.len().checked_sub(SIGNATURE_SIZE).ok_or(BlockError::InvalidDataSize)?;
    Ok(Signature::from_slice(&data[start..])?)
}
