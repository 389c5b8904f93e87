//! Blocks: header plus transactions
//!
//! Signing, signature verification (including challenged blocks) and the
//! Merkle transactions root of protobuf blocks live here.

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, trace, warn};

use super::binary::transaction_block_length;
use super::{
    detect_codec, proto, BinaryCodec, BlockCodec, BlockHeader, BlockId, BlockVersion,
    ChallengedHeader, NxtConsensus, ProtobufCodec, Rewards, WireFormat,
};
use crate::constants::DEFAULT_REWARD_VOTE;
use crate::crypto::{self, Digest, MerkleProof, MerkleTree, PublicKey, SecretKey, Signature};
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::transaction::Transactions;
use crate::Scheme;

/// A block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub header: BlockHeader,
    #[serde(default, skip_serializing_if = "Transactions::is_empty")]
    pub transactions: Transactions,
}

impl Block {
    pub fn builder(version: BlockVersion) -> BlockBuilder {
        BlockBuilder::new(version)
    }

    pub fn id(&self) -> BlockId {
        self.header.id
    }

    pub fn version(&self) -> BlockVersion {
        self.header.version
    }

    /// Encode in the format of the block's version
    pub fn marshal(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        self.header.version.codec().marshal_block(self, scheme)
    }

    /// Decode either format, telling them apart by the first byte
    pub fn unmarshal(data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
        let codec = detect_codec(data)?;
        codec.unmarshal_block(data, scheme).map_err(|e| {
            debug!(
                format = %codec.format(),
                size = data.len(),
                error = %e,
                "block decoding failed"
            );
            e
        })
    }

    pub fn marshal_binary(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        BinaryCodec.marshal_block(self, scheme)
    }

    pub fn unmarshal_binary(data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
        BinaryCodec.unmarshal_block(data, scheme)
    }

    pub fn marshal_to_protobuf(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        ProtobufCodec.marshal_block(self, scheme)
    }

    pub fn unmarshal_from_protobuf(data: &[u8], scheme: Scheme) -> Result<Block, BlockError> {
        ProtobufCodec.unmarshal_block(data, scheme)
    }

    pub fn to_protobuf(&self, scheme: Scheme) -> Result<pb::Block, BlockError> {
        proto::block_to_protobuf(self, scheme)
    }

    /// Protobuf block annotated with height, VRF and reward shares sorted by address
    pub fn to_protobuf_with_height(
        &self,
        scheme: Scheme,
        height: u64,
        vrf: &[u8],
        rewards: &Rewards,
    ) -> Result<pb::BlockWithHeight, BlockError> {
        proto::block_with_height(self, scheme, height, vrf, rewards)
    }

    pub fn marshal_with_height(
        &self,
        scheme: Scheme,
        height: u64,
        vrf: &[u8],
        rewards: &Rewards,
    ) -> Result<Vec<u8>, BlockError> {
        proto::marshal_block_with_height(self, scheme, height, vrf, rewards)
    }

    /// Write the full encoding, returning the number of bytes written
    pub fn write_to<W: Write>(&self, w: &mut W, scheme: Scheme) -> Result<usize, BlockError> {
        let bytes = self.marshal(scheme)?;
        w.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Write the bytes the block signature covers
    pub fn write_to_without_signature<W: Write>(
        &self,
        w: &mut W,
        scheme: Scheme,
    ) -> Result<usize, BlockError> {
        let bytes = self.signing_payload(scheme)?;
        w.write_all(&bytes)?;
        Ok(bytes.len())
    }

    fn signing_payload(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        self.header.version.codec().signing_payload(self, scheme)
    }

    /// Sign with the generator's key and regenerate the ID.
    ///
    /// Protobuf blocks must have their transactions root set first.
    pub fn sign(&mut self, scheme: Scheme, secret: &SecretKey) -> Result<(), BlockError> {
        let payload = self.signing_payload(scheme)?;
        self.header.block_signature = crypto::sign(secret, &payload)?;
        self.header.generate_block_id(scheme)?;
        trace!(block = %self.header.id.short_string(), "block signed");
        Ok(())
    }

    /// Check the generator's signature. A challenged block is valid only if
    /// both the challenger's signature and the original generator's
    /// signature over the rebuilt original header hold.
    pub fn verify_signature(&self, scheme: Scheme) -> Result<bool, BlockError> {
        let payload = self.signing_payload(scheme)?;
        let valid = crypto::verify(&self.header.generator, &self.header.block_signature, &payload);
        if !valid {
            debug!(block = %self.header.id.short_string(), "block signature rejected");
            return Ok(false);
        }
        let Some(original) = self.header.original_header() else {
            return Ok(true);
        };
        let original_payload = original.marshal_header_to_protobuf_without_signature(scheme)?;
        let original_valid =
            crypto::verify(&original.generator, &original.block_signature, &original_payload);
        if !original_valid {
            debug!(block = %self.header.id.short_string(), "challenged header signature rejected");
        }
        Ok(original_valid)
    }

    /// Leaves of the transactions root; only protobuf blocks commit to one
    fn transactions_tree(&self, scheme: Scheme) -> Result<MerkleTree, BlockError> {
        if self.header.version < BlockVersion::Protobuf {
            return Err(BlockError::UnsupportedVersion {
                version: self.header.version.as_u8(),
                format: WireFormat::Protobuf,
            });
        }
        let mut tree = MerkleTree::new();
        for tx in &self.transactions {
            tree.push(&tx.merkle_bytes(scheme)?);
        }
        Ok(tree)
    }

    /// Merkle root over the signed protobuf encodings of the transactions.
    /// Binary blocks have no root and get `UnsupportedVersion`.
    pub fn transactions_root(&self, scheme: Scheme) -> Result<Digest, BlockError> {
        Ok(self.transactions_tree(scheme)?.root())
    }

    pub fn set_transactions_root(&mut self, scheme: Scheme) -> Result<(), BlockError> {
        self.header.transactions_root = self.transactions_root(scheme)?.0.to_vec();
        Ok(())
    }

    /// Set the root for protobuf blocks; binary blocks have none
    pub fn set_transactions_root_if_possible(&mut self, scheme: Scheme) -> Result<(), BlockError> {
        if self.header.version >= BlockVersion::Protobuf {
            self.set_transactions_root(scheme)?;
        }
        Ok(())
    }

    /// True for binary blocks, which carry no root
    pub fn verify_transactions_root(&self, scheme: Scheme) -> Result<bool, BlockError> {
        if self.header.version < BlockVersion::Protobuf {
            return Ok(true);
        }
        let root = self.transactions_root(scheme)?;
        let valid = self.header.transactions_root.as_slice() == root.as_bytes();
        if !valid {
            warn!(
                block = %self.header.id.short_string(),
                expected = %root,
                "transactions root mismatch"
            );
        }
        Ok(valid)
    }

    /// Inclusion proof for the transaction at `index` against the transactions root
    pub fn transaction_proof(
        &self,
        scheme: Scheme,
        index: usize,
    ) -> Result<Option<MerkleProof>, BlockError> {
        Ok(self.transactions_tree(scheme)?.proof(index))
    }

    /// Structural checks that need no chain state
    pub fn validate_content(&self, scheme: Scheme) -> Result<(), BlockError> {
        let header = &self.header;
        if !header.id.is_valid(header.version) {
            return Err(BlockError::Content(format!(
                "block ID does not fit version {}",
                header.version
            )));
        }
        if !header.parent.is_valid(header.version) && !is_protocol_upgrade_parent(header) {
            return Err(BlockError::Content(
                "parent reference does not fit block version".to_string(),
            ));
        }
        if header.transaction_count as usize != self.transactions.count() {
            return Err(BlockError::Content(format!(
                "header counts {} transactions, block holds {}",
                header.transaction_count,
                self.transactions.count()
            )));
        }
        if header.version < BlockVersion::Protobuf {
            let expected = transaction_block_length(header.version, &self.transactions)?;
            if header.transaction_block_length != expected {
                return Err(BlockError::Content(format!(
                    "transaction block length {} should be {}",
                    header.transaction_block_length, expected
                )));
            }
        } else if header.challenged_header.is_some() && header.state_hash.is_none() {
            return Err(BlockError::Content("challenging block without state hash".to_string()));
        }
        for tx in &self.transactions {
            tx.validate(scheme)?;
        }
        if !self.verify_transactions_root(scheme)? {
            return Err(BlockError::Content("transactions root mismatch".to_string()));
        }
        Ok(())
    }
}

/// The first protobuf block references the last binary block by signature
fn is_protocol_upgrade_parent(header: &BlockHeader) -> bool {
    header.version == BlockVersion::Protobuf && header.parent.is_signature()
}

/// Step-by-step block construction
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    version: BlockVersion,
    timestamp: u64,
    parent: BlockId,
    generator: PublicKey,
    nxt_consensus: NxtConsensus,
    features: Vec<i16>,
    reward_vote: i64,
    state_hash: Option<Digest>,
    challenged_header: Option<ChallengedHeader>,
    transactions: Transactions,
}

impl BlockBuilder {
    pub fn new(version: BlockVersion) -> Self {
        Self {
            version,
            timestamp: 0,
            parent: BlockId::Undefined,
            generator: PublicKey::default(),
            nxt_consensus: NxtConsensus::default(),
            features: Vec::new(),
            reward_vote: DEFAULT_REWARD_VOTE,
            state_hash: None,
            challenged_header: None,
            transactions: Transactions::default(),
        }
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn parent(mut self, parent: BlockId) -> Self {
        self.parent = parent;
        self
    }

    pub fn generator(mut self, generator: PublicKey) -> Self {
        self.generator = generator;
        self
    }

    pub fn consensus(mut self, base_target: u64, generation_signature: Vec<u8>) -> Self {
        self.nxt_consensus = NxtConsensus::new(base_target, generation_signature);
        self
    }

    pub fn features(mut self, features: Vec<i16>) -> Self {
        self.features = features;
        self
    }

    pub fn reward_vote(mut self, reward_vote: i64) -> Self {
        self.reward_vote = reward_vote;
        self
    }

    pub fn state_hash(mut self, state_hash: Digest) -> Self {
        self.state_hash = Some(state_hash);
        self
    }

    pub fn challenged_header(mut self, challenged: ChallengedHeader) -> Self {
        self.challenged_header = Some(challenged);
        self
    }

    pub fn transactions(mut self, transactions: Transactions) -> Self {
        self.transactions = transactions;
        self
    }

    /// Assemble the block: derive the transaction count and either the
    /// transaction block length (binary) or the transactions root
    /// (protobuf), then the ID. The block is not signed.
    pub fn build(self, scheme: Scheme) -> Result<Block, BlockError> {
        let transaction_count = u32::try_from(self.transactions.count())
            .map_err(|_| BlockError::encoding("too many transactions"))?;
        let transaction_block_length = if self.version < BlockVersion::Protobuf {
            transaction_block_length(self.version, &self.transactions)?
        } else {
            0
        };
        let mut block = Block {
            header: BlockHeader {
                version: self.version,
                timestamp: self.timestamp,
                parent: self.parent,
                features: self.features,
                reward_vote: self.reward_vote,
                nxt_consensus: self.nxt_consensus,
                transaction_block_length,
                transaction_count,
                generator: self.generator,
                block_signature: Signature::default(),
                transactions_root: Vec::new(),
                state_hash: self.state_hash,
                challenged_header: self.challenged_header,
                id: BlockId::Undefined,
            },
            transactions: self.transactions,
        };
        block.set_transactions_root_if_possible(scheme)?;
        block.header.generate_block_id(scheme)?;
        Ok(block)
    }
}
