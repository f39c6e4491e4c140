/// Merkle Commitments over 32-byte Chunks
///
/// Every stored value is committed as the root of a "min tree": the smallest
/// power-of-two binary tree that covers all of its 32-byte chunks.
///
/// GUARANTEES:
/// - Leaves are keccak digests of the chunk bytes (the last chunk may be short)
/// - Leaves past the end of the value are the zero word
/// - Internal nodes are keccak(left || right)
/// - An empty value commits to the zero root

use primitive_types::H256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::{h256_word, keccak256, keccak_words, WORD_SIZE};

// ==================== ERROR TYPES ====================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("chunk index {index} is outside a tree of {leaves} leaves")]
    IndexOutOfRange { index: u64, leaves: u64 },

    #[error("proof has {got} siblings, tree depth is {expected}")]
    DepthMismatch { expected: usize, got: usize },

    #[error("computed root does not match the committed root")]
    RootMismatch,
}

pub type MerkleResult<T> = Result<T, MerkleError>;

// ==================== TREE SHAPE ====================

/// Number of chunks a value of `len` bytes occupies (at least one).
pub fn chunk_count(len: usize) -> u64 {
    if len <= WORD_SIZE {
        1
    } else {
        ((len - 1) / WORD_SIZE + 1) as u64
    }
}

/// Depth of the min tree covering `len` bytes.
pub fn min_tree_depth(len: usize) -> u32 {
    let chunks = chunk_count(len);
    chunks.next_power_of_two().trailing_zeros()
}

fn leaf_hash(data: &[u8], index: u64) -> H256 {
    let offset = index as usize * WORD_SIZE;
    if offset >= data.len() {
        return H256::zero();
    }
    let end = usize::min(offset + WORD_SIZE, data.len());
    keccak256(&data[offset..end])
}

fn node_hash(left: H256, right: H256) -> H256 {
    keccak_words(&[h256_word(left), h256_word(right)])
}

fn leaf_level(data: &[u8], depth: u32) -> Vec<H256> {
    let leaves = 1u64 << depth;
    (0..leaves).map(|i| leaf_hash(data, i)).collect()
}

fn parent_level(level: &[H256]) -> Vec<H256> {
    level
        .chunks(2)
        .map(|pair| node_hash(pair[0], pair[1]))
        .collect()
}

/// Root of the min tree over `data`.
pub fn merkle_root_min_tree(data: &[u8]) -> H256 {
    if data.is_empty() {
        return H256::zero();
    }
    let mut level = leaf_level(data, min_tree_depth(data.len()));
    while level.len() > 1 {
        level = parent_level(&level);
    }
    level[0]
}

// ==================== PROOFS ====================

/// Inclusion proof for one chunk: the chunk word, the root it claims
/// membership in, and the ordered sibling hashes from leaf to root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf: H256,
    pub root: H256,
    pub siblings: Vec<H256>,
}

impl InclusionProof {
    /// Builds the proof for chunk `index` of `data`.
    pub fn generate(data: &[u8], index: u64) -> MerkleResult<Self> {
        let depth = min_tree_depth(data.len());
        let leaves = 1u64 << depth;
        if index >= leaves {
            return Err(MerkleError::IndexOutOfRange { index, leaves });
        }

        let mut siblings = Vec::with_capacity(depth as usize);
        let mut level = leaf_level(data, depth);
        let mut position = index as usize;
        while level.len() > 1 {
            siblings.push(level[position ^ 1]);
            level = parent_level(&level);
            position /= 2;
        }

        Ok(Self {
            leaf: chunk_word(data, index),
            root: merkle_root_min_tree(data),
            siblings,
        })
    }
}

/// The chunk at `index` as a zero-padded word.
pub fn chunk_word(data: &[u8], index: u64) -> H256 {
    let mut word = [0u8; WORD_SIZE];
    let offset = index as usize * WORD_SIZE;
    if offset < data.len() {
        let end = usize::min(offset + WORD_SIZE, data.len());
        word[..end - offset].copy_from_slice(&data[offset..end]);
    }
    H256::from(word)
}

/// Verifies that `chunk` (the exact bytes that were hashed into the leaf)
/// sits at `index` under `root`.
pub fn verify_inclusion(chunk: &[u8], index: u64, root: H256, siblings: &[H256]) -> MerkleResult<()> {
    let depth = siblings.len();
    if depth < 64 && index >= (1u64 << depth) {
        return Err(MerkleError::IndexOutOfRange {
            index,
            leaves: 1u64 << depth,
        });
    }

    let mut hash = keccak256(chunk);
    let mut position = index;
    for sibling in siblings {
        hash = if position % 2 == 0 {
            node_hash(hash, *sibling)
        } else {
            node_hash(*sibling, hash)
        };
        position /= 2;
    }

    if hash == root {
        Ok(())
    } else {
        Err(MerkleError::RootMismatch)
    }
}
