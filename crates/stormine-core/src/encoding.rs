/// ENCODING SCHEME
///
/// A miner stores every slot XOR-masked with a stream that only it can
/// derive, so one physical copy cannot serve several miners:
///
///   encodingKey   = keccak(truncatedRoot, miner, kvIdx)
///   mask          = PRF(encodingKey mod p, sampleIdxInKv)
///   encodedSample = decodedSample XOR mask
///
/// The PRF is proven in zero knowledge; here we only assemble its public
/// inputs `[encodingKey mod p, ω^sampleIdxInKv, mask]` and check the proof
/// together with Merkle inclusion of the decoded chunk.

use log::warn;
use primitive_types::{H160, H256, U256};
use stormine_crypto::codec::{decode_decode_proof, decode_inclusion_proof};
use stormine_crypto::field::{fr_to_u256, reduce, sample_point};
use stormine_crypto::hash::{address_word, h256_to_u256, h256_word, keccak_words, u256_to_h256, u256_word};
use stormine_crypto::{verify_inclusion, DecodeProof, WORD_SIZE};

use crate::blob_store::BlobStore;
use crate::kv_store::StorageLedger;

/// Bytes of the commitment root that enter the encoding key.
pub const TRUNCATED_ROOT_LEN: usize = 24;

/// The root with its low-order bytes zeroed.
pub fn truncate_root(root: H256) -> H256 {
    let mut bytes = root.to_fixed_bytes();
    bytes[TRUNCATED_ROOT_LEN..].fill(0);
    H256::from(bytes)
}

/// `keccak(truncatedRoot, miner, kvIdx)` over ABI words.
pub fn encoding_key(root: H256, miner: H160, kv_idx: u64) -> H256 {
    keccak_words(&[
        h256_word(truncate_root(root)),
        address_word(miner),
        u256_word(U256::from(kv_idx)),
    ])
}

/// Public inputs of the decode proof.
pub fn decode_public_inputs(encoding_key: H256, sample_idx: u64, mask: U256, domain_bits: u32) -> [U256; 3] {
    [
        fr_to_u256(reduce(h256_to_u256(encoding_key))),
        fr_to_u256(sample_point(sample_idx, domain_bits)),
        mask,
    ]
}

/// `encoded XOR mask`
pub fn unmask(encoded: H256, mask: U256) -> H256 {
    u256_to_h256(h256_to_u256(encoded) ^ mask)
}

impl<B: BlobStore> StorageLedger<B> {
    /// Encoding key of slot `kv_idx` for `miner`; an empty slot uses the zero
    /// root.
    pub fn get_encoding_key(&self, kv_idx: u64, miner: H160) -> H256 {
        let root = self.slot(kv_idx).map_or_else(H256::zero, |e| e.root);
        encoding_key(root, miner, kv_idx)
    }

    /// Checks that `mask` is the PRF output for `(encoding_key, sample_idx)`.
    pub fn decode_sample(&self, proof: &DecodeProof, encoding_key: H256, sample_idx: u64, mask: U256) -> bool {
        let inputs = decode_public_inputs(encoding_key, sample_idx, mask, self.config.prf_domain_bits);
        self.verifier.verify(proof, &inputs)
    }

    /// Unmasks the sample and checks both its Merkle inclusion in slot
    /// `kv_idx` and the decode proof for `miner`'s mask.
    #[allow(clippy::too_many_arguments)]
    pub fn decode_and_check_inclusive(
        &self,
        kv_idx: u64,
        sample_idx: u64,
        miner: H160,
        encoded_sample: H256,
        mask: U256,
        inclusion_proof: &[u8],
        decode_proof: &[u8],
    ) -> bool {
        match self.check_sample(kv_idx, sample_idx, miner, encoded_sample, mask, inclusion_proof, decode_proof) {
            Ok(()) => true,
            Err(reason) => {
                warn!("sample {} of kvIdx {} rejected: {}", sample_idx, kv_idx, reason);
                false
            }
        }
    }

    /// Like `decode_and_check_inclusive`, with the rejection reason.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn check_sample(
        &self,
        kv_idx: u64,
        sample_idx: u64,
        miner: H160,
        encoded_sample: H256,
        mask: U256,
        inclusion_proof: &[u8],
        decode_proof: &[u8],
    ) -> Result<(), String> {
        let decoded = unmask(encoded_sample, mask);
        self.check_inclusion(kv_idx, sample_idx, decoded, inclusion_proof)?;

        let proof = decode_decode_proof(decode_proof).map_err(|e| format!("malformed decode proof: {}", e))?;
        let key = self.get_encoding_key(kv_idx, miner);
        if !self.decode_sample(&proof, key, sample_idx, mask) {
            return Err("decode proof rejected".to_string());
        }
        Ok(())
    }

    fn check_inclusion(&self, kv_idx: u64, sample_idx: u64, decoded: H256, inclusion_proof: &[u8]) -> Result<(), String> {
        let chunk_start = sample_idx.saturating_mul(WORD_SIZE as u64);
        let (size, root) = match self.slot(kv_idx) {
            Some(entry) if !entry.root.is_zero() && chunk_start < entry.size => (entry.size, entry.root),
            // empty slot, empty value or past the end: must decode to zeros
            _ => {
                return if decoded.is_zero() {
                    Ok(())
                } else {
                    Err("non-zero sample outside stored data".to_string())
                };
            }
        };

        let proof = decode_inclusion_proof(inclusion_proof).map_err(|e| format!("malformed inclusion proof: {}", e))?;
        if proof.leaf != decoded {
            return Err("inclusion proof leaf differs from decoded sample".to_string());
        }
        if proof.root != root {
            return Err("inclusion proof root differs from stored commitment".to_string());
        }

        let chunk_len = (size - chunk_start).min(WORD_SIZE as u64) as usize;
        let bytes = decoded.as_bytes();
        if bytes[chunk_len..].iter().any(|b| *b != 0) {
            return Err("decoded sample has data past the end of the value".to_string());
        }
        verify_inclusion(&bytes[..chunk_len], sample_idx, root, &proof.siblings).map_err(|e| e.to_string())
    }
}
