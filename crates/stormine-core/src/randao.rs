/// BLOCK RANDOMNESS BINDING
///
/// Mining seeds come from the randao (mix hash) field of a recent block
/// header. The miner supplies the RLP-encoded header; it is accepted only if
/// it hashes to the canonical block hash the chain reports for that height.

use std::collections::VecDeque;

use primitive_types::H256;
use rlp::Rlp;
use stormine_crypto::keccak256;

use crate::error::{StorageError, StorageResult};

/// Position of the mix hash in an RLP block header
pub const MIX_HASH_INDEX: usize = 13;

/// Block hashes the chain keeps available (EVM `BLOCKHASH` window)
pub const BLOCK_HASH_WINDOW: usize = 256;

/// Assumed seconds per block when back-dating a mine to its seed block
pub const SECONDS_PER_BLOCK: u64 = 12;

/// Source of canonical block hashes.
pub trait BlockHashOracle {
    /// `None` when the block is unknown or outside the retrievable window.
    fn block_hash(&self, number: u64) -> Option<H256>;
}

/// Rolling window of the most recent block hashes.
#[derive(Debug, Clone, Default)]
pub struct RecentBlockHashes {
    hashes: VecDeque<(u64, H256)>,
}

impl RecentBlockHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the hash of the next block. Heights must be pushed in order;
    /// a gap or rewind restarts the window.
    pub fn push(&mut self, number: u64, hash: H256) {
        if let Some(&(last, _)) = self.hashes.back() {
            if last.checked_add(1) != Some(number) {
                self.hashes.clear();
            }
        }
        self.hashes.push_back((number, hash));
        while self.hashes.len() > BLOCK_HASH_WINDOW {
            self.hashes.pop_front();
        }
    }

    pub fn latest(&self) -> Option<u64> {
        self.hashes.back().map(|(n, _)| *n)
    }
}

impl BlockHashOracle for RecentBlockHashes {
    fn block_hash(&self, number: u64) -> Option<H256> {
        let (first, _) = *self.hashes.front()?;
        let offset = usize::try_from(number.checked_sub(first)?).ok()?;
        self.hashes.get(offset).map(|(_, hash)| *hash)
    }
}

/// Extracts the randao value from `header` after checking it hashes to
/// `block_hash`.
pub fn randao_from_header(header: &[u8], block_hash: H256) -> StorageResult<H256> {
    if keccak256(header) != block_hash {
        return Err(StorageError::RandomnessMismatch(
            "header does not hash to the block hash".to_string(),
        ));
    }

    let rlp = Rlp::new(header);
    if !rlp.is_list() {
        return Err(StorageError::RandomnessMismatch("header is not an RLP list".to_string()));
    }
    let mix_hash = rlp
        .at(MIX_HASH_INDEX)
        .and_then(|item| item.data().map(<[u8]>::to_vec))
        .map_err(|e| StorageError::RandomnessMismatch(format!("header has no mix hash: {}", e)))?;
    if mix_hash.len() > 32 {
        return Err(StorageError::RandomnessMismatch(format!(
            "mix hash is {} bytes",
            mix_hash.len()
        )));
    }

    let mut word = [0u8; 32];
    word[32 - mix_hash.len()..].copy_from_slice(&mix_hash);
    Ok(H256::from(word))
}

/// Timestamp a mine seeded by `block_number` is credited with.
pub fn mine_timestamp(now: u64, current_block: u64, block_number: u64) -> u64 {
    let age = current_block.saturating_sub(block_number);
    now.saturating_sub(age.saturating_mul(SECONDS_PER_BLOCK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlp::RlpStream;

    fn header(mix_hash: H256) -> Vec<u8> {
        let mut stream = RlpStream::new_list(15);
        for i in 0..15u64 {
            if i as usize == MIX_HASH_INDEX {
                stream.append(&mix_hash.as_bytes().to_vec());
            } else {
                stream.append(&i);
            }
        }
        stream.out().to_vec()
    }

    #[test]
    fn test_randao_extraction() {
        let mix = H256::repeat_byte(0x5a);
        let encoded = header(mix);
        assert_eq!(randao_from_header(&encoded, keccak256(&encoded)).unwrap(), mix);
    }

    #[test]
    fn test_header_hash_mismatch() {
        let encoded = header(H256::repeat_byte(1));
        assert!(matches!(
            randao_from_header(&encoded, H256::zero()),
            Err(StorageError::RandomnessMismatch(_))
        ));
    }

    #[test]
    fn test_short_header_rejected() {
        let mut stream = RlpStream::new_list(3);
        stream.append(&1u64).append(&2u64).append(&3u64);
        let encoded = stream.out().to_vec();
        assert!(randao_from_header(&encoded, keccak256(&encoded)).is_err());
    }

    #[test]
    fn test_recent_window() {
        let mut hashes = RecentBlockHashes::new();
        for n in 0..300u64 {
            hashes.push(n, H256::from_low_u64_be(n + 1));
        }
        assert_eq!(hashes.latest(), Some(299));
        assert_eq!(hashes.block_hash(299), Some(H256::from_low_u64_be(300)));
        assert_eq!(hashes.block_hash(44), Some(H256::from_low_u64_be(45)));
        assert_eq!(hashes.block_hash(43), None);
        assert_eq!(hashes.block_hash(300), None);

        hashes.push(500, H256::zero());
        assert_eq!(hashes.block_hash(299), None);
    }

    #[test]
    fn test_mine_timestamp_backdates() {
        assert_eq!(mine_timestamp(1000, 10, 8), 976);
        assert_eq!(mine_timestamp(10, 10, 0), 0);
        assert_eq!(mine_timestamp(1000, 10, 10), 1000);
    }
}
