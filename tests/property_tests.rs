//! Property-based and adversarial tests for RH block encoding
//!
//! These tests verify codec invariants hold under random inputs and
//! tampering scenarios.

use proptest::prelude::*;
use rh_blocks::constants::{DEFAULT_REWARD_VOTE, MAIN_NET_SCHEME};
use rh_blocks::crypto::{fast_hash, Digest, MerkleTree, PublicKey, SecretKey, Signature};
use rh_blocks::transaction::{GenesisTransaction, TransferTransaction};
use rh_blocks::{
    Address, Block, BlockHeader, BlockId, BlockVersion, NxtConsensus, Transaction, Transactions,
};

fn fixed_key() -> SecretKey {
    SecretKey::from_bytes(&[7u8; 32]).unwrap()
}

fn binary_header(
    version: BlockVersion,
    timestamp: u64,
    base_target: u64,
    generation_signature: [u8; 32],
    features: Vec<i16>,
    reward_vote: i64,
) -> BlockHeader {
    let ng = version >= BlockVersion::Ng;
    BlockHeader {
        version,
        timestamp,
        parent: BlockId::Signature(Signature([1u8; 64])),
        features: if ng { features } else { Vec::new() },
        reward_vote: if version >= BlockVersion::Reward {
            reward_vote
        } else {
            DEFAULT_REWARD_VOTE
        },
        nxt_consensus: NxtConsensus::new(base_target, generation_signature.to_vec()),
        transaction_block_length: if ng { 4 } else { 1 },
        transaction_count: 0,
        generator: PublicKey([3u8; 32]),
        block_signature: Signature([9u8; 64]),
        transactions_root: Vec::new(),
        state_hash: None,
        challenged_header: None,
        id: BlockId::Signature(Signature([9u8; 64])),
    }
}

fn protobuf_block(
    timestamp: u64,
    features: Vec<i16>,
    reward_vote: i64,
    transactions: Transactions,
) -> Block {
    let key = fixed_key();
    let mut block = Block::builder(BlockVersion::Protobuf)
        .timestamp(timestamp)
        .parent(BlockId::Digest(fast_hash(b"parent")))
        .generator(key.public_key())
        .consensus(500, vec![2u8; 32])
        .features(features)
        .reward_vote(reward_vote)
        .state_hash(fast_hash(b"state"))
        .transactions(transactions)
        .build(MAIN_NET_SCHEME)
        .unwrap();
    block.sign(MAIN_NET_SCHEME, &key).unwrap();
    block
}

fn transfer(amount: u64) -> Transaction {
    let sender = fixed_key();
    let recipient = Address::from_public_key(MAIN_NET_SCHEME, &SecretKey::generate().public_key());
    let mut tx = TransferTransaction::new(
        2,
        sender.public_key(),
        recipient,
        amount,
        100_000,
        1_700_000_000_000,
        Vec::new(),
    );
    tx.sign(&sender).unwrap();
    tx.into()
}

fn genesis(amount: u64) -> Transaction {
    let recipient = Address::from_public_key(MAIN_NET_SCHEME, &fixed_key().public_key());
    GenesisTransaction::new(recipient, amount, 1_460_678_400_000).into()
}

fn binary_version() -> impl Strategy<Value = BlockVersion> {
    prop_oneof![
        Just(BlockVersion::Genesis),
        Just(BlockVersion::Plain),
        Just(BlockVersion::Ng),
        Just(BlockVersion::Reward),
    ]
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

proptest! {
    /// Binary headers survive an encode/decode cycle bit-exactly
    #[test]
    fn prop_binary_header_roundtrip(
        version in binary_version(),
        timestamp in any::<u64>(),
        base_target in any::<u64>(),
        generation_signature in any::<[u8; 32]>(),
        features in proptest::collection::vec(any::<i16>(), 0..16),
        reward_vote in any::<i64>(),
    ) {
        let header = binary_header(
            version,
            timestamp,
            base_target,
            generation_signature,
            features,
            reward_vote,
        );
        let bytes = header.marshal_header(MAIN_NET_SCHEME).unwrap();
        let decoded = BlockHeader::unmarshal_header_from_binary(&bytes, MAIN_NET_SCHEME).unwrap();
        prop_assert_eq!(decoded, header);
    }

    /// Protobuf blocks survive an encode/decode cycle, negative feature votes included
    #[test]
    fn prop_protobuf_block_roundtrip(
        timestamp in 0u64..i64::MAX as u64,
        features in proptest::collection::vec(any::<i16>(), 0..8),
        reward_vote in any::<i64>(),
        amounts in proptest::collection::vec(1u64..1_000_000, 0..4),
    ) {
        let txs: Transactions = amounts.into_iter().map(genesis).collect();
        let block = protobuf_block(timestamp, features, reward_vote, txs);
        let bytes = block.marshal(MAIN_NET_SCHEME).unwrap();
        let decoded = Block::unmarshal(&bytes, MAIN_NET_SCHEME).unwrap();
        prop_assert!(decoded.verify_signature(MAIN_NET_SCHEME).unwrap());
        prop_assert_eq!(decoded, block);
    }

    /// The protobuf block ID depends only on the unsigned header
    #[test]
    fn prop_protobuf_id_deterministic(timestamp in 0u64..i64::MAX as u64) {
        let a = protobuf_block(timestamp, Vec::new(), 0, Transactions::default());
        let b = protobuf_block(timestamp, Vec::new(), 0, Transactions::default());
        prop_assert_eq!(a.id(), b.id());
        let payload =
            a.header.marshal_header_to_protobuf_without_signature(MAIN_NET_SCHEME).unwrap();
        let expected = fast_hash(&payload);
        prop_assert_eq!(a.id(), BlockId::Digest(expected));
    }

    /// Different timestamps produce different IDs
    #[test]
    fn prop_different_timestamp_different_id(timestamp in 0u64..(i64::MAX as u64 - 1)) {
        let a = protobuf_block(timestamp, Vec::new(), 0, Transactions::default());
        let b = protobuf_block(timestamp + 1, Vec::new(), 0, Transactions::default());
        prop_assert_ne!(a.id(), b.id());
    }

    /// Arbitrary input never panics the decoder
    #[test]
    fn prop_garbage_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = Block::unmarshal(&data, MAIN_NET_SCHEME);
        let _ = BlockHeader::unmarshal_header_from_binary(&data, MAIN_NET_SCHEME);
        let _ = BlockHeader::unmarshal_header_from_protobuf(&data, MAIN_NET_SCHEME);
    }

    /// Every valid binary header is rejected once truncated
    #[test]
    fn prop_truncated_header_rejected(version in binary_version(), cut in 0usize..100) {
        let header = binary_header(version, 1, 2, [0u8; 32], vec![1, 2], 3);
        let bytes = header.marshal_header(MAIN_NET_SCHEME).unwrap();
        let cut = cut.min(bytes.len() - 1);
        let decoded = BlockHeader::unmarshal_header_from_binary(&bytes[..cut], MAIN_NET_SCHEME);
        prop_assert!(decoded.is_err());
    }
}

// ============================================================================
// ADVERSARIAL TESTS
// ============================================================================

/// Test: Transaction substitution
///
/// Attacker swaps a transaction in a signed protobuf block. The header
/// signature still holds, but the transactions root no longer matches.
#[test]
fn test_transaction_substitution_detected() {
    let txs: Transactions = vec![transfer(10), transfer(20)].into_iter().collect();
    let block = protobuf_block(1_700_000_000_000, Vec::new(), 0, txs);
    assert!(block.verify_transactions_root(MAIN_NET_SCHEME).unwrap());

    let mut forged = block.clone();
    forged.transactions = vec![transfer(10), transfer(20_000)].into_iter().collect();
    assert!(forged.verify_signature(MAIN_NET_SCHEME).unwrap());
    assert!(!forged.verify_transactions_root(MAIN_NET_SCHEME).unwrap());
    assert!(forged.validate_content(MAIN_NET_SCHEME).is_err());
}

/// Test: Duplicated tail transaction
///
/// A tree that pairs an odd node with itself gives [a, b, c] and
/// [a, b, c, c] the same root. Ours must not.
#[test]
fn test_duplicated_tail_changes_root() {
    let leaves: Vec<Vec<u8>> = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    let mut three = MerkleTree::new();
    let mut four = MerkleTree::new();
    for leaf in &leaves {
        three.push(leaf);
        four.push(leaf);
    }
    four.push(b"c");
    assert_ne!(three.root(), four.root());
}

/// Test: Tampered binary block
///
/// Flipping any byte of the signed part of a binary block either breaks
/// decoding or breaks the signature.
#[test]
fn test_binary_bit_flips_never_verify() {
    let key = fixed_key();
    let mut block = Block::builder(BlockVersion::Reward)
        .timestamp(1_600_000_000_000)
        .parent(BlockId::Signature(Signature([5u8; 64])))
        .generator(key.public_key())
        .consensus(153_722_867, vec![8u8; 32])
        .features(vec![1])
        .reward_vote(600_000_000)
        .transactions(vec![genesis(1)].into_iter().collect())
        .build(MAIN_NET_SCHEME)
        .unwrap();
    block.sign(MAIN_NET_SCHEME, &key).unwrap();
    let bytes = block.marshal(MAIN_NET_SCHEME).unwrap();

    // skip the version byte: other versions change the layout entirely
    for i in (1..bytes.len() - 64).step_by(7) {
        let mut tampered = bytes.clone();
        tampered[i] ^= 0x01;
        if let Ok(decoded) = Block::unmarshal(&tampered, MAIN_NET_SCHEME) {
            let valid = decoded.verify_signature(MAIN_NET_SCHEME).unwrap_or(false);
            assert!(!valid, "byte {} flipped", i);
        }
    }
}

/// Test: Oversized block ID text
///
/// IDs longer than any base58 signature are refused before decoding.
#[test]
fn test_oversized_id_rejected() {
    let long = "z".repeat(10_000);
    assert!(BlockId::from_base58(&long).unwrap_err().is_invalid_size());
}

/// Test: Zero root for empty protobuf blocks
#[test]
fn test_empty_protobuf_block_has_zero_root() {
    let block = protobuf_block(1, Vec::new(), 0, Transactions::default());
    assert_eq!(block.header.transactions_root, Digest::zero().0.to_vec());
}
