//! Miner-side helpers shared by the integration tests.

#![allow(dead_code)]

use primitive_types::{H160, H256, U256};
use stormine_core::{BlobStore as _, MiningSubmission, StorageConfig, StorageLedger};
use stormine_crypto::codec::{encode_decode_proof, encode_inclusion_proof};
use stormine_crypto::field::{fr_from_u256, fr_to_u256, reduce, sample_point};
use stormine_crypto::hash::{h256_to_u256, u256_to_h256};
use stormine_crypto::merkle::chunk_word;
use stormine_crypto::{DecodeProof, InclusionProof, ProofVerifier, WORD_SIZE};

/// Accepts exactly the masks of the toy PRF `mask = key * ω^idx`, without
/// any pairing work.
pub struct MaskRelation;

impl ProofVerifier for MaskRelation {
    fn verify(&self, _proof: &DecodeProof, public_inputs: &[U256]) -> bool {
        let [key, point, mask] = public_inputs else {
            return false;
        };
        match (fr_from_u256(*key), fr_from_u256(*point), fr_from_u256(*mask)) {
            (Some(key), Some(point), Some(mask)) => key * point == mask,
            _ => false,
        }
    }
}

pub fn key(n: u64) -> H256 {
    H256::from_low_u64_be(n)
}

/// Account that stores the test data.
pub fn client() -> H160 {
    H160::from_low_u64_be(0xc11e)
}

/// 256 chunks labelled with their index, offset by `salt`.
pub fn labelled_blob(salt: u32) -> Vec<u8> {
    (0..256u32)
        .flat_map(|i| {
            let mut word = [0u8; WORD_SIZE];
            let label = format!("{}-{}", salt, i);
            word[..label.len()].copy_from_slice(label.as_bytes());
            word
        })
        .collect()
}

pub fn small_config() -> StorageConfig {
    StorageConfig {
        max_kv_size_bits: 13,
        shard_size_bits: 14,
        random_checks: 2,
        cutoff: 40,
        diff_adj_divisor: 1024,
        treasury_share: 0,
        nonce_limit: 16,
        start_time: 0,
        storage_cost: U256::zero(),
        dcf_factor: U256::zero(),
        minimum_diff: U256::one(),
        prepaid_amount: U256::zero(),
        ..StorageConfig::default()
    }
}

/// Toy PRF mask for `(kv_idx, sample_idx)` held by `miner`.
pub fn mask_for(ledger: &StorageLedger, kv_idx: u64, miner: H160, sample_idx: u64) -> U256 {
    let key = reduce(h256_to_u256(ledger.get_encoding_key(kv_idx, miner)));
    let point = sample_point(sample_idx, ledger.config().prf_domain_bits);
    fr_to_u256(key * point)
}

/// Decoded chunk and its inclusion proof bytes, as an honest miner holding
/// the data would produce them.
pub fn read_sample(ledger: &StorageLedger, kv_idx: u64, sample_idx: u64) -> (H256, Vec<u8>) {
    let Some(key) = ledger.key_at(kv_idx) else {
        return (H256::zero(), Vec::new());
    };
    let Some(data) = ledger.blob_store().get_blob(&key) else {
        return (H256::zero(), Vec::new());
    };
    if sample_idx as usize * WORD_SIZE >= data.len() {
        return (H256::zero(), Vec::new());
    }
    let proof = InclusionProof::generate(data, sample_idx).expect("sample inside the tree");
    (chunk_word(data, sample_idx), encode_inclusion_proof(&proof))
}

pub fn zero_decode_proof(_inputs: [U256; 3]) -> Vec<u8> {
    encode_decode_proof(&DecodeProof {
        a: [U256::zero(); 2],
        b: [[U256::zero(); 2]; 2],
        c: [U256::zero(); 2],
    })
}

/// Walks the hash chain from `hash0` and assembles a full submission.
/// `prove` turns the public inputs of each round into decode-proof bytes.
pub fn build_submission(
    ledger: &StorageLedger,
    shard_idx: u64,
    miner: H160,
    nonce: u64,
    hash0: H256,
    prove: impl Fn([U256; 3]) -> Vec<u8>,
) -> MiningSubmission {
    let mut submission = MiningSubmission {
        shard_idx,
        miner,
        nonce,
        ..MiningSubmission::default()
    };
    let mut hash = hash0;
    for _ in 0..ledger.config().random_checks {
        let (_, kv_idx, sample_idx) = ledger.get_sample_idx(shard_idx, hash);
        let (decoded, inclusion) = read_sample(ledger, kv_idx, sample_idx);
        let mask = mask_for(ledger, kv_idx, miner, sample_idx);
        let encoded = u256_to_h256(h256_to_u256(decoded) ^ mask);
        let inputs = stormine_core::encoding::decode_public_inputs(
            ledger.get_encoding_key(kv_idx, miner),
            sample_idx,
            mask,
            ledger.config().prf_domain_bits,
        );

        submission.encoded_samples.push(encoded);
        submission.masks.push(mask);
        submission.inclusion_proofs.push(inclusion);
        submission.decode_proofs.push(prove(inputs));
        hash = stormine_core::get_next_hash0(hash, encoded);
    }
    submission
}
