//! Stormine cryptographic primitives
//!
//! Keccak word helpers, min-tree Merkle commitments, the BN254 scalar field
//! and Groth16 verification of decode proofs, plus the ABI codecs used to
//! carry proofs over the wire.

pub mod codec;
pub mod field;
pub mod groth16;
pub mod hash;
pub mod merkle;

pub use codec::{
    decode_decode_proof, decode_inclusion_proof, encode_decode_proof, encode_inclusion_proof,
    ProofCodecError,
};
pub use groth16::{DecodeProof, EvmVerifyingKey, Groth16Error, Groth16Verifier, ProofVerifier};
pub use hash::{keccak256, WORD_SIZE};
pub use merkle::{merkle_root_min_tree, verify_inclusion, InclusionProof, MerkleError};
