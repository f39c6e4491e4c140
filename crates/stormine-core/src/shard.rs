/// SHARD ADDRESS SPACE
///
/// Slots are grouped into fixed-capacity shards; shard `s` owns kvIdx
/// `[s * kvsPerShard, (s + 1) * kvsPerShard)`. Each shard is mined
/// independently and keeps its own difficulty and reward pool.
///
/// A sample address is drawn from the running audit hash:
///   globalSample  = hash0 mod samplesPerShard
///   kvIdx         = shard * kvsPerShard + globalSample / samplesPerKv
///   sampleIdxInKv = globalSample mod samplesPerKv

use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use stormine_crypto::hash::h256_to_u256;

use crate::config::{StorageConfig, SAMPLE_SIZE_BITS};

/// Where one audited sample lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleAddress {
    /// Sample index within the whole shard
    pub global_sample_idx: u64,
    pub kv_idx: u64,
    pub sample_idx_in_kv: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardAddressSpace {
    /// log2 of samples per slot
    pub sample_size_bits: u32,
    /// log2 of slots per shard
    pub shard_entry_bits: u32,
}

impl ShardAddressSpace {
    pub fn new(max_kv_size_bits: u32, shard_size_bits: u32) -> Self {
        Self {
            sample_size_bits: max_kv_size_bits.saturating_sub(SAMPLE_SIZE_BITS),
            shard_entry_bits: shard_size_bits.saturating_sub(max_kv_size_bits),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.max_kv_size_bits, config.shard_size_bits)
    }

    pub fn samples_per_kv(&self) -> u64 {
        1u64 << self.sample_size_bits
    }

    pub fn kvs_per_shard(&self) -> u64 {
        1u64 << self.shard_entry_bits
    }

    /// log2 of samples per shard
    pub fn shard_sample_bits(&self) -> u32 {
        self.sample_size_bits + self.shard_entry_bits
    }

    /// Shard owning `kv_idx`.
    pub fn shard_of(&self, kv_idx: u64) -> u64 {
        kv_idx >> self.shard_entry_bits
    }

    /// Number of shards needed to hold `entry_count` slots, counting the shard
    /// the next put would land in.
    pub fn shard_count(&self, entry_count: u64) -> u64 {
        self.shard_of(entry_count) + 1
    }

    pub fn sample_address(&self, shard_idx: u64, hash0: H256) -> SampleAddress {
        let bits = self.shard_sample_bits();
        let global = if bits >= 64 {
            h256_to_u256(hash0).low_u64()
        } else {
            (h256_to_u256(hash0) % (U256::one() << bits)).low_u64()
        };
        SampleAddress {
            global_sample_idx: global,
            kv_idx: (shard_idx << self.shard_entry_bits) + (global >> self.sample_size_bits),
            sample_idx_in_kv: global & (self.samples_per_kv() - 1),
        }
    }
}

/// Mutable per-shard mining state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardState {
    pub difficulty: U256,
    pub last_mine_time: u64,
    /// Prepayments not yet released to miners
    pub reward_pool: U256,
    /// Successful mines so far
    pub blocks_mined: u64,
}

impl ShardState {
    pub fn genesis(minimum_diff: U256, opened_at: u64) -> Self {
        Self {
            difficulty: minimum_diff,
            last_mine_time: opened_at,
            reward_pool: U256::zero(),
            blocks_mined: 0,
        }
    }
}
