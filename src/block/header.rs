//! Block headers
//!
//! A header is everything in a block except the transactions themselves.
//! Protobuf headers may additionally carry a challenged header: the header
//! originally proposed by a generator whose block was successfully
//! challenged, which the challenger's block embeds.

use serde::{Deserialize, Serialize};

use super::{proto, BinaryCodec, BlockCodec, BlockId, BlockVersion, ProtobufCodec};
use crate::codec::base58;
use crate::constants::{DEFAULT_REWARD_VOTE, GENERATION_SIGNATURE_SIZE};
use crate::crypto::{fast_hash, Digest, PublicKey, Signature};
use crate::error::BlockError;
use crate::protobuf as pb;
use crate::Scheme;

/// Proof-of-stake consensus data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NxtConsensus {
    #[serde(rename = "base-target")]
    pub base_target: u64,
    #[serde(rename = "generation-signature", with = "base58::vec")]
    pub generation_signature: Vec<u8>,
}

impl NxtConsensus {
    pub fn new(base_target: u64, generation_signature: Vec<u8>) -> Self {
        Self { base_target, generation_signature }
    }

    /// Size in the binary layout, where the generation signature is fixed-width
    pub fn binary_size(&self) -> usize {
        8 + GENERATION_SIGNATURE_SIZE
    }
}

/// Header fields of a challenged block, together with its original signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengedHeader {
    #[serde(flatten)]
    pub nxt_consensus: NxtConsensus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<i16>,
    #[serde(rename = "generatorPublicKey")]
    pub generator: PublicKey,
    #[serde(rename = "desiredReward")]
    pub reward_vote: i64,
    pub timestamp: u64,
    pub state_hash: Digest,
    pub header_signature: Signature,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub version: BlockVersion,
    pub timestamp: u64,
    #[serde(rename = "reference")]
    pub parent: BlockId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<i16>,
    #[serde(rename = "desiredReward", default = "default_reward_vote")]
    pub reward_vote: i64,
    #[serde(rename = "nxt-consensus")]
    pub nxt_consensus: NxtConsensus,
    /// Size of the binary transaction block; zero for protobuf blocks
    #[serde(default, skip_serializing_if = "is_zero")]
    pub transaction_block_length: u32,
    pub transaction_count: u32,
    #[serde(rename = "generatorPublicKey")]
    pub generator: PublicKey,
    #[serde(rename = "signature")]
    pub block_signature: Signature,
    #[serde(default, with = "base58::vec", skip_serializing_if = "Vec::is_empty")]
    pub transactions_root: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_hash: Option<Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenged_header: Option<ChallengedHeader>,
    #[serde(default)]
    pub id: BlockId,
}

fn default_reward_vote() -> i64 {
    DEFAULT_REWARD_VOTE
}

impl BlockHeader {
    /// Derive and store the ID: the signature for binary versions, the
    /// digest of the unsigned protobuf header for protobuf versions
    pub fn generate_block_id(&mut self, scheme: Scheme) -> Result<(), BlockError> {
        self.id = if self.version < BlockVersion::Protobuf {
            BlockId::Signature(self.block_signature)
        } else {
            BlockId::Digest(fast_hash(&self.marshal_header_to_protobuf_without_signature(scheme)?))
        };
        Ok(())
    }

    pub fn block_id(&self) -> BlockId {
        self.id
    }

    pub fn is_challenged(&self) -> bool {
        self.challenged_header.is_some()
    }

    /// The header the challenged generator originally signed, rebuilt from
    /// this header and its embedded challenged header. None when the block
    /// carries no challenge.
    pub fn original_header(&self) -> Option<BlockHeader> {
        let ch = self.challenged_header.as_ref()?;
        let mut original = self.clone();
        original.timestamp = ch.timestamp;
        original.nxt_consensus = ch.nxt_consensus.clone();
        original.features = ch.features.clone();
        original.generator = ch.generator;
        original.reward_vote = ch.reward_vote;
        original.state_hash = Some(ch.state_hash);
        original.block_signature = ch.header_signature;
        original.challenged_header = None;
        Some(original)
    }

    /// Header-only encoding in the format of this header's version
    pub fn marshal_header(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        self.version.codec().marshal_header(self, scheme)
    }

    pub fn marshal_header_to_binary(&self) -> Result<Vec<u8>, BlockError> {
        BinaryCodec.marshal_header(self, 0)
    }

    pub fn unmarshal_header_from_binary(
        data: &[u8],
        scheme: Scheme,
    ) -> Result<BlockHeader, BlockError> {
        BinaryCodec.unmarshal_header(data, scheme)
    }

    pub fn marshal_header_to_protobuf(&self, scheme: Scheme) -> Result<Vec<u8>, BlockError> {
        ProtobufCodec.marshal_header(self, scheme)
    }

    /// Encoded protobuf header message alone, the payload for signing and hashing
    pub fn marshal_header_to_protobuf_without_signature(
        &self,
        scheme: Scheme,
    ) -> Result<Vec<u8>, BlockError> {
        proto::marshal_header_without_signature(self, scheme)
    }

    pub fn unmarshal_header_from_protobuf(
        data: &[u8],
        scheme: Scheme,
    ) -> Result<BlockHeader, BlockError> {
        ProtobufCodec.unmarshal_header(data, scheme)
    }

    pub fn to_protobuf_header(&self, scheme: Scheme) -> Result<pb::block::Header, BlockError> {
        proto::header_to_protobuf(self, scheme)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::MAIN_NET_SCHEME;
    use crate::crypto::SecretKey;

    pub(crate) fn challenged(generator: PublicKey) -> ChallengedHeader {
        ChallengedHeader {
            nxt_consensus: NxtConsensus::new(77, vec![3u8; 32]),
            features: vec![14, 15],
            generator,
            reward_vote: 600_000_000,
            timestamp: 1_700_000_000_500,
            state_hash: fast_hash(b"original state"),
            header_signature: Signature([8u8; 64]),
        }
    }

    pub(crate) fn protobuf_header() -> BlockHeader {
        BlockHeader {
            version: BlockVersion::Protobuf,
            timestamp: 1_700_000_001_000,
            parent: BlockId::from_digest(fast_hash(b"parent")),
            features: vec![1, -2],
            reward_vote: 700_000_000,
            nxt_consensus: NxtConsensus::new(120, vec![5u8; 32]),
            transaction_block_length: 0,
            transaction_count: 0,
            generator: SecretKey::generate().public_key(),
            block_signature: Signature([1u8; 64]),
            transactions_root: Digest::zero().0.to_vec(),
            state_hash: Some(fast_hash(b"state")),
            challenged_header: None,
            id: BlockId::Undefined,
        }
    }

    #[test]
    fn test_original_header_absent_without_challenge() {
        assert!(protobuf_header().original_header().is_none());
    }

    #[test]
    fn test_original_header_overwrites_challenged_fields() {
        let original_generator = SecretKey::generate().public_key();
        let mut header = protobuf_header();
        header.challenged_header = Some(challenged(original_generator));

        let original = header.original_header().unwrap();
        assert_eq!(original.timestamp, 1_700_000_000_500);
        assert_eq!(original.nxt_consensus.base_target, 77);
        assert_eq!(original.features, vec![14, 15]);
        assert_eq!(original.generator, original_generator);
        assert_eq!(original.reward_vote, 600_000_000);
        assert_eq!(original.state_hash, Some(fast_hash(b"original state")));
        assert_eq!(original.block_signature, Signature([8u8; 64]));
        assert!(original.challenged_header.is_none());
        // untouched fields come from the challenging header
        assert_eq!(original.parent, header.parent);
        assert_eq!(original.transactions_root, header.transactions_root);
        // the source header is not modified
        assert!(header.challenged_header.is_some());
    }

    #[test]
    fn test_protobuf_id_ignores_signature() {
        let mut a = protobuf_header();
        let mut b = a.clone();
        b.block_signature = Signature([2u8; 64]);
        a.generate_block_id(MAIN_NET_SCHEME).unwrap();
        b.generate_block_id(MAIN_NET_SCHEME).unwrap();
        assert_eq!(a.id, b.id);
        let payload = a.marshal_header_to_protobuf_without_signature(MAIN_NET_SCHEME).unwrap();
        let expected = fast_hash(&payload);
        assert_eq!(a.id, BlockId::Digest(expected));
    }

    #[test]
    fn test_binary_id_is_signature() {
        let mut header = protobuf_header();
        header.version = BlockVersion::Ng;
        header.generate_block_id(MAIN_NET_SCHEME).unwrap();
        assert_eq!(header.id, BlockId::Signature(Signature([1u8; 64])));
    }

    #[test]
    fn test_json_field_names() {
        let mut header = protobuf_header();
        header.challenged_header = Some(challenged(header.generator));
        header.generate_block_id(MAIN_NET_SCHEME).unwrap();
        let value = serde_json::to_value(&header).unwrap();
        for key in [
            "version",
            "timestamp",
            "reference",
            "features",
            "desiredReward",
            "nxt-consensus",
            "transactionCount",
            "generatorPublicKey",
            "signature",
            "transactionsRoot",
            "stateHash",
            "challengedHeader",
            "id",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert!(value.get("transactionBlockLength").is_none());
        assert!(value["nxt-consensus"].get("base-target").is_some());
        assert!(value["challengedHeader"].get("headerSignature").is_some());
        assert!(value["challengedHeader"].get("generation-signature").is_some());

        let back: BlockHeader = serde_json::from_value(value).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn test_json_omits_empty_features() {
        let mut header = protobuf_header();
        header.features = Vec::new();
        let mut ch = challenged(header.generator);
        ch.features = Vec::new();
        header.challenged_header = Some(ch);
        header.generate_block_id(MAIN_NET_SCHEME).unwrap();

        let value = serde_json::to_value(&header).unwrap();
        assert!(value.get("features").is_none());
        assert!(value["challengedHeader"].get("features").is_none());

        let back: BlockHeader = serde_json::from_value(value).unwrap();
        assert_eq!(back, header);
    }
}
