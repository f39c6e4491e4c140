/// PROOF WIRE CODECS
///
/// Mining submissions carry their per-sample proofs as opaque ABI-encoded
/// byte strings:
/// - decode proof:    abi.encode((uint256,uint256),(uint256[2],uint256[2]),(uint256,uint256))
/// - inclusion proof: abi.encode((bytes32 leaf, bytes32 root, bytes32[] siblings))
///
/// Decoders are strict: short input, out-of-range offsets and trailing
/// garbage are all rejected.

use primitive_types::{H256, U256};
use thiserror::Error;

use crate::groth16::DecodeProof;
use crate::hash::{h256_word, u256_word, WORD_SIZE};
use crate::merkle::InclusionProof;

/// Encoded size of a decode proof: eight words.
pub const DECODE_PROOF_LEN: usize = 8 * WORD_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofCodecError {
    #[error("expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },
    #[error("offset {offset} points outside a {len}-byte payload")]
    Offset { offset: U256, len: usize },
    #[error("sibling count {count} does not fit a {len}-byte payload")]
    ArrayLength { count: U256, len: usize },
    #[error("{0} trailing bytes after proof")]
    Trailing(usize),
}

struct Words<'a> {
    bytes: &'a [u8],
}

impl<'a> Words<'a> {
    fn word(&self, at: usize) -> Result<[u8; WORD_SIZE], ProofCodecError> {
        let end = at.checked_add(WORD_SIZE).ok_or(ProofCodecError::Length {
            expected: usize::MAX,
            got: self.bytes.len(),
        })?;
        if end > self.bytes.len() {
            return Err(ProofCodecError::Length {
                expected: end,
                got: self.bytes.len(),
            });
        }
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&self.bytes[at..end]);
        Ok(word)
    }

    fn u256(&self, at: usize) -> Result<U256, ProofCodecError> {
        Ok(U256::from_big_endian(&self.word(at)?))
    }

    fn offset(&self, at: usize) -> Result<usize, ProofCodecError> {
        let offset = self.u256(at)?;
        if offset > U256::from(self.bytes.len()) {
            return Err(ProofCodecError::Offset {
                offset,
                len: self.bytes.len(),
            });
        }
        Ok(offset.as_usize())
    }
}

pub fn encode_decode_proof(proof: &DecodeProof) -> Vec<u8> {
    let words = [
        proof.a[0],
        proof.a[1],
        proof.b[0][0],
        proof.b[0][1],
        proof.b[1][0],
        proof.b[1][1],
        proof.c[0],
        proof.c[1],
    ];
    words.iter().flat_map(|w| u256_word(*w)).collect()
}

pub fn decode_decode_proof(bytes: &[u8]) -> Result<DecodeProof, ProofCodecError> {
    if bytes.len() != DECODE_PROOF_LEN {
        return Err(ProofCodecError::Length {
            expected: DECODE_PROOF_LEN,
            got: bytes.len(),
        });
    }
    let words = Words { bytes };
    let at = |i: usize| words.u256(i * WORD_SIZE);
    Ok(DecodeProof {
        a: [at(0)?, at(1)?],
        b: [[at(2)?, at(3)?], [at(4)?, at(5)?]],
        c: [at(6)?, at(7)?],
    })
}

pub fn encode_inclusion_proof(proof: &InclusionProof) -> Vec<u8> {
    let mut out = Vec::with_capacity((5 + proof.siblings.len()) * WORD_SIZE);
    out.extend_from_slice(&u256_word(U256::from(WORD_SIZE)));
    out.extend_from_slice(&h256_word(proof.leaf));
    out.extend_from_slice(&h256_word(proof.root));
    out.extend_from_slice(&u256_word(U256::from(3 * WORD_SIZE)));
    out.extend_from_slice(&u256_word(U256::from(proof.siblings.len())));
    for sibling in &proof.siblings {
        out.extend_from_slice(&h256_word(*sibling));
    }
    out
}

pub fn decode_inclusion_proof(bytes: &[u8]) -> Result<InclusionProof, ProofCodecError> {
    let words = Words { bytes };
    let tuple = words.offset(0)?;
    let leaf = H256::from(words.word(tuple)?);
    let root = H256::from(words.word(tuple + WORD_SIZE)?);
    let array = tuple + words.offset(tuple + 2 * WORD_SIZE)?;

    let count = words.u256(array)?;
    let body = array + WORD_SIZE;
    let available = bytes.len().saturating_sub(body) / WORD_SIZE;
    if count > U256::from(available) {
        return Err(ProofCodecError::ArrayLength {
            count,
            len: bytes.len(),
        });
    }
    let count = count.as_usize();

    let siblings = (0..count)
        .map(|i| words.word(body + i * WORD_SIZE).map(H256::from))
        .collect::<Result<Vec<_>, _>>()?;

    let consumed = body + count * WORD_SIZE;
    if consumed < bytes.len() {
        return Err(ProofCodecError::Trailing(bytes.len() - consumed));
    }

    Ok(InclusionProof {
        leaf,
        root,
        siblings,
    })
}
