//! Conversion between block types and protobuf messages, block version 5 onward

use prost::Message;

use super::{
    Block, BlockHeader, BlockId, BlockVersion, ChallengedHeader, NxtConsensus, Rewards, WireFormat,
};
use crate::codec::with_buffer;
use crate::crypto::{Digest, PublicKey, Signature};
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::transaction::Transactions;
use crate::Scheme;

fn check_protobuf_version(version: BlockVersion) -> Result<(), BlockError> {
    if version.wire_format() != WireFormat::Protobuf {
        return Err(BlockError::UnsupportedVersion {
            version: version.as_u8(),
            format: WireFormat::Protobuf,
        });
    }
    Ok(())
}

fn features_to_protobuf(features: &[i16]) -> Vec<u32> {
    // sign-extending, as the protocol has always done
    features.iter().map(|f| *f as u32).collect()
}

fn features_from_protobuf(votes: &[u32]) -> Result<Vec<i16>, BlockError> {
    votes
        .iter()
        .map(|v| {
            let feature = *v as i16;
            if feature as u32 == *v {
                Ok(feature)
            } else {
                Err(BlockError::encoding(format!("feature vote {} out of range", v)))
            }
        })
        .collect()
}

fn state_hash_from_protobuf(bytes: &[u8]) -> Result<Option<Digest>, BlockError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Digest::from_slice(bytes)?))
}

fn challenged_to_protobuf(ch: &ChallengedHeader) -> pb::block::header::ChallengedHeader {
    pb::block::header::ChallengedHeader {
        base_target: ch.nxt_consensus.base_target as i64,
        generation_signature: ch.nxt_consensus.generation_signature.clone(),
        feature_votes: features_to_protobuf(&ch.features),
        timestamp: ch.timestamp as i64,
        generator: ch.generator.as_bytes().to_vec(),
        reward_vote: ch.reward_vote,
        state_hash: ch.state_hash.as_bytes().to_vec(),
        header_signature: ch.header_signature.as_bytes().to_vec(),
    }
}

fn challenged_from_protobuf(
    ch: pb::block::header::ChallengedHeader,
) -> Result<ChallengedHeader, BlockError> {
    Ok(ChallengedHeader {
        nxt_consensus: NxtConsensus::new(ch.base_target as u64, ch.generation_signature),
        features: features_from_protobuf(&ch.feature_votes)?,
        generator: PublicKey::from_slice(&ch.generator)?,
        reward_vote: ch.reward_vote,
        timestamp: ch.timestamp as u64,
        state_hash: Digest::from_slice(&ch.state_hash)?,
        header_signature: Signature::from_slice(&ch.header_signature)?,
    })
}

pub(crate) fn header_to_protobuf(
    header: &BlockHeader,
    scheme: Scheme,
) -> Result<pb::block::Header, BlockError> {
    check_protobuf_version(header.version)?;
    if let BlockId::Undefined = header.parent {
        return Err(BlockError::encoding("undefined parent reference"));
    }
    Ok(pb::block::Header {
        chain_id: i32::from(scheme),
        reference: header.parent.bytes().to_vec(),
        base_target: header.nxt_consensus.base_target as i64,
        generation_signature: header.nxt_consensus.generation_signature.clone(),
        feature_votes: features_to_protobuf(&header.features),
        timestamp: header.timestamp as i64,
        version: i32::from(header.version.as_u8()),
        generator: header.generator.as_bytes().to_vec(),
        reward_vote: header.reward_vote,
        transactions_root: header.transactions_root.clone(),
        state_hash: header.state_hash.map(|h| h.as_bytes().to_vec()).unwrap_or_default(),
        challenged_header: header.challenged_header.as_ref().map(challenged_to_protobuf),
    })
}

/// Header from its protobuf message. Transaction count and ID are left
/// for the caller, which knows the enclosing block.
fn header_from_protobuf(
    header: pb::block::Header,
    signature: &[u8],
    scheme: Scheme,
) -> Result<BlockHeader, BlockError> {
    if header.chain_id != i32::from(scheme) {
        return Err(BlockError::encoding(format!(
            "chain id {} does not match scheme {}",
            header.chain_id, scheme
        )));
    }
    let raw_version = u8::try_from(header.version).map_err(|_| {
        BlockError::encoding(format!("block version {} out of range", header.version))
    })?;
    let version = BlockVersion::try_from(raw_version)?;
    check_protobuf_version(version)?;
    Ok(BlockHeader {
        version,
        timestamp: header.timestamp as u64,
        parent: BlockId::from_bytes(&header.reference)?,
        features: features_from_protobuf(&header.feature_votes)?,
        reward_vote: header.reward_vote,
        nxt_consensus: NxtConsensus::new(header.base_target as u64, header.generation_signature),
        transaction_block_length: 0,
        transaction_count: 0,
        generator: PublicKey::from_slice(&header.generator)?,
        block_signature: Signature::from_slice(signature)?,
        transactions_root: header.transactions_root,
        state_hash: state_hash_from_protobuf(&header.state_hash)?,
        challenged_header: header.challenged_header.map(challenged_from_protobuf).transpose()?,
        id: BlockId::Undefined,
    })
}

fn encode(message: &impl Message) -> Result<Vec<u8>, BlockError> {
    with_buffer(|buf| -> Result<Vec<u8>, BlockError> {
        message.encode(buf)?;
        Ok(buf.to_vec())
    })
}

pub(crate) fn marshal_header_without_signature(
    header: &BlockHeader,
    scheme: Scheme,
) -> Result<Vec<u8>, BlockError> {
    encode(&header_to_protobuf(header, scheme)?)
}

/// A header travels as a block message without transactions
pub(crate) fn marshal_header(header: &BlockHeader, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
    encode(&pb::Block {
        header: Some(header_to_protobuf(header, scheme)?),
        signature: header.block_signature.as_bytes().to_vec(),
        transactions: Vec::new(),
    })
}

pub(crate) fn unmarshal_header(data: &[u8], scheme: Scheme) -> Result<BlockHeader, BlockError> {
    let message = pb::Block::decode(data)?;
    let count = message.transactions.len();
    let pb_header = message.header.ok_or_else(|| BlockError::encoding("missing block header"))?;
    let mut header = header_from_protobuf(pb_header, &message.signature, scheme)?;
    header.transaction_count =
        u32::try_from(count).map_err(|_| BlockError::encoding("too many transactions"))?;
    header.generate_block_id(scheme)?;
    Ok(header)
}

pub(crate) fn block_to_protobuf(block: &Block, scheme: Scheme) -> Result<pb::Block, BlockError> {
    if block.header.transaction_count as usize != block.transactions.count() {
        return Err(BlockError::Content(format!(
            "header counts {} transactions, block holds {}",
            block.header.transaction_count,
            block.transactions.count()
        )));
    }
    Ok(pb::Block {
        header: Some(header_to_protobuf(&block.header, scheme)?),
        signature: block.header.block_signature.as_bytes().to_vec(),
        transactions: block.transactions.to_protobuf(scheme)?,
    })
}

pub(crate) fn block_from_protobuf(message: pb::Block, scheme: Scheme) -> Result<Block, BlockError> {
    let pb_header = message.header.ok_or_else(|| BlockError::encoding("missing block header"))?;
    let mut header = header_from_protobuf(pb_header, &message.signature, scheme)?;
    let transactions = Transactions::from_protobuf(message.transactions, scheme)?;
    header.transaction_count = u32::try_from(transactions.count())
        .map_err(|_| BlockError::encoding("too many transactions"))?;
    header.generate_block_id(scheme)?;
    Ok(Block { header, transactions })
}

pub(crate) fn marshal_block(block: &Block, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
    encode(&block_to_protobuf(block, scheme)?)
}

pub(crate) fn unmarshal_block(data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
    block_from_protobuf(pb::Block::decode(data)?, scheme)
}

pub(crate) fn block_with_height(
    block: &Block,
    scheme: Scheme,
    height: u64,
    vrf: &[u8],
    rewards: &Rewards,
) -> Result<pb::BlockWithHeight, BlockError> {
    let height = u32::try_from(height)
        .map_err(|_| BlockError::encoding(format!("height {} out of range", height)))?;
    Ok(pb::BlockWithHeight {
        block: Some(block_to_protobuf(block, scheme)?),
        height,
        vrf: vrf.to_vec(),
        reward_shares: rewards.to_protobuf(),
    })
}

pub(crate) fn marshal_block_with_height(
    block: &Block,
    scheme: Scheme,
    height: u64,
    vrf: &[u8],
    rewards: &Rewards,
) -> Result<Vec<u8>, BlockError> {
    encode(&block_with_height(block, scheme, height, vrf, rewards)?)
}
