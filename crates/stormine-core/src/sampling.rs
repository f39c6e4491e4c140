/// HASH-CHAIN SAMPLING
///
/// An audit is a left fold over `randomChecks` rounds. Each round draws its
/// sample address from the running hash, requires the supplied sample to
/// verify, then absorbs the encoded sample into the hash:
///
///   hash0      = keccak(randao, miner, nonce)
///   addr_i     = sampleAddress(shard, hash_i)
///   hash_{i+1} = keccak(hash_i, encodedSample_i)
///
/// The fold result is what the difficulty target is checked against.

use primitive_types::{H160, H256, U256};
use stormine_crypto::hash::{address_word, h256_word, keccak_words, u256_word};

use crate::blob_store::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::kv_store::StorageLedger;

pub fn get_init_hash0(randao: H256, miner: H160, nonce: u64) -> H256 {
    keccak_words(&[h256_word(randao), address_word(miner), u256_word(U256::from(nonce))])
}

pub fn get_next_hash0(hash0: H256, encoded_sample: H256) -> H256 {
    keccak_words(&[h256_word(hash0), h256_word(encoded_sample)])
}

/// Folds `samples` into `hash0` without any verification.
pub fn fold_hash0(hash0: H256, samples: &[H256]) -> H256 {
    samples.iter().fold(hash0, |hash, sample| get_next_hash0(hash, *sample))
}

/// Inputs a miner supplies for one audit round.
#[derive(Debug, Clone, Copy)]
pub struct SampleRound<'a> {
    pub encoded_sample: H256,
    pub mask: U256,
    /// ABI-encoded Merkle inclusion proof
    pub inclusion_proof: &'a [u8],
    /// ABI-encoded Groth16 decode proof
    pub decode_proof: &'a [u8],
}

/// Zips the per-round arrays, which must all hold exactly `expected` items.
pub fn collect_rounds<'a>(
    expected: usize,
    encoded_samples: &[H256],
    masks: &[U256],
    inclusion_proofs: &'a [Vec<u8>],
    decode_proofs: &'a [Vec<u8>],
) -> StorageResult<Vec<SampleRound<'a>>> {
    let lengths = [
        encoded_samples.len(),
        masks.len(),
        inclusion_proofs.len(),
        decode_proofs.len(),
    ];
    if lengths.iter().any(|len| *len != expected) {
        return Err(StorageError::InvalidInput(format!(
            "expected {} samples, masks and proofs, got {:?}",
            expected, lengths
        )));
    }
    Ok(encoded_samples
        .iter()
        .zip(masks)
        .zip(inclusion_proofs.iter().zip(decode_proofs))
        .map(|((encoded, mask), (inclusion, decode))| SampleRound {
            encoded_sample: *encoded,
            mask: *mask,
            inclusion_proof: inclusion,
            decode_proof: decode,
        })
        .collect())
}

impl<B: BlobStore> StorageLedger<B> {
    /// Runs the audit over the supplied samples and returns the folded hash.
    /// Any failing round aborts the whole audit.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_samples(
        &self,
        shard_idx: u64,
        hash0: H256,
        miner: H160,
        encoded_samples: &[H256],
        masks: &[U256],
        inclusion_proofs: &[Vec<u8>],
        decode_proofs: &[Vec<u8>],
    ) -> StorageResult<H256> {
        let rounds = collect_rounds(
            self.config.random_checks,
            encoded_samples,
            masks,
            inclusion_proofs,
            decode_proofs,
        )?;
        self.fold_rounds(shard_idx, hash0, miner, &rounds)
    }

    pub fn fold_rounds(&self, shard_idx: u64, hash0: H256, miner: H160, rounds: &[SampleRound<'_>]) -> StorageResult<H256> {
        rounds.iter().enumerate().try_fold(hash0, |hash0, (index, round)| {
            let addr = self.space.sample_address(shard_idx, hash0);
            self.check_sample(
                addr.kv_idx,
                addr.sample_idx_in_kv,
                miner,
                round.encoded_sample,
                round.mask,
                round.inclusion_proof,
                round.decode_proof,
            )
            .map_err(|reason| StorageError::ProofVerification {
                index,
                reason: format!("kvIdx {} sample {}: {}", addr.kv_idx, addr.sample_idx_in_kv, reason),
            })?;
            Ok(get_next_hash0(hash0, round.encoded_sample))
        })
    }

    /// `(globalSampleIdx, kvIdx, sampleIdxInKv)` for `hash0` in `shard_idx`.
    pub fn get_sample_idx(&self, shard_idx: u64, hash0: H256) -> (u64, u64, u64) {
        let addr = self.space.sample_address(shard_idx, hash0);
        (addr.global_sample_idx, addr.kv_idx, addr.sample_idx_in_kv)
    }
}
