//! Merkle tree implementation
//!
//! Used for computing and proving block transaction roots.
//! Leaves and inner nodes are hashed under distinct prefixes, and an odd
//! node at the end of a level is carried up unchanged instead of being
//! paired with itself, so no two different leaf lists share a root.

use super::{fast_hash_parts, Digest};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Hash of a single leaf
pub fn leaf_hash(data: &[u8]) -> Digest {
    fast_hash_parts(&[&[LEAF_PREFIX], data])
}

/// Hash two child nodes together
pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    fast_hash_parts(&[&[NODE_PREFIX], &left.0, &right.0])
}

/// Append-only Merkle tree
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    leaves: Vec<Digest>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the next leaf
    pub fn push(&mut self, data: &[u8]) {
        self.leaves.push(leaf_hash(data));
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Root of the tree. An empty tree has the zero root.
    pub fn root(&self) -> Digest {
        if self.leaves.is_empty() {
            return Digest::zero();
        }
        let mut level = self.leaves.clone();
        while level.len() > 1 {
            level = next_level(&level);
        }
        level[0]
    }

    /// Build an inclusion proof for the leaf at `index`
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }

        let mut level = self.leaves.clone();
        let mut current = index;
        let mut siblings = Vec::new();

        while level.len() > 1 {
            let sibling = if current % 2 == 0 { current + 1 } else { current - 1 };
            // the last node of an odd level has no sibling and moves up as-is
            if let Some(hash) = level.get(sibling) {
                siblings.push((*hash, current % 2 == 1));
            }
            level = next_level(&level);
            current /= 2;
        }

        Some(MerkleProof { index, siblings })
    }
}

fn next_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => node_hash(left, right),
            [single] => *single,
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// Merkle proof for a leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Index of the leaf
    pub index: usize,
    /// Sibling hashes from leaf to root
    pub siblings: Vec<(Digest, bool)>, // (hash, is_left)
}

impl MerkleProof {
    /// Verify this proof for raw leaf data against a root
    pub fn verify(&self, leaf: &[u8], root: &Digest) -> bool {
        let mut current = leaf_hash(leaf);

        for (sibling, is_left) in &self.siblings {
            current = if *is_left {
                node_hash(sibling, &current)
            } else {
                node_hash(&current, sibling)
            };
        }

        current == *root
    }
}
