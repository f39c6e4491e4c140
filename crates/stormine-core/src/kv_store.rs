/// PRICED KEY-VALUE LEDGER
///
/// (owner, key) -> {kvIdx, size, commitment root}, with value bytes held in
/// a pluggable `BlobStore`. Keys are scoped to the account that stored them:
/// two accounts may use the same key without touching each other's entry. New slots are paid for up front at the current
/// decayed price; the payment feeds the owning shard's reward pool (minus
/// the treasury share) and is released to miners over time.
///
/// GUARANTEES:
/// - Only the owner of an entry can read it by key, replace it or remove it
/// - Slots are dense: kvIdx runs over [0, kvEntryCount)
/// - Removing a key moves the last slot into the freed kvIdx
/// - Replacing a value keeps its kvIdx and costs nothing
/// - Every mutating call validates fully before it writes anything

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use stormine_crypto::hash::{address_word, h256_word, keccak_words};
use stormine_crypto::{merkle_root_min_tree, Groth16Verifier, ProofVerifier, WORD_SIZE};
use stormine_economics::{DecayCurve, DifficultyParams, TreasurySplit};

use crate::blob_store::{BlobStore, MemoryBlobStore};
use crate::config::{ConfigError, StorageConfig};
use crate::error::{StorageError, StorageResult};
use crate::events::StorageEvent;
use crate::shard::{ShardAddressSpace, ShardState};

/// Ledger key of `key` stored by `owner`: `keccak(owner, key)`.
pub fn storage_key(owner: H160, key: H256) -> H256 {
    keccak_words(&[address_word(owner), h256_word(key)])
}

/// Block in which a call executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockContext {
    pub number: u64,
    pub timestamp: u64,
}

impl BlockContext {
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }
}

/// Slot metadata for one stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    pub kv_idx: u64,
    pub size: u64,
    pub root: H256,
}

pub struct StorageLedger<B: BlobStore = MemoryBlobStore> {
    pub(crate) config: StorageConfig,
    pub(crate) space: ShardAddressSpace,
    pub(crate) curve: DecayCurve,
    pub(crate) difficulty: DifficultyParams,
    pub(crate) split: TreasurySplit,
    pub(crate) verifier: Box<dyn ProofVerifier>,
    pub(crate) shards: Vec<ShardState>,
    pub(crate) events: Vec<StorageEvent>,
    balances: BTreeMap<H160, U256>,
    entries: BTreeMap<H256, KvEntry>,
    idx_keys: Vec<H256>,
    blobs: B,
    /// (block number, puts in that block)
    block_updates: (u64, u64),
}

impl<B: BlobStore> StorageLedger<B> {
    pub fn new(config: StorageConfig, blobs: B, verifier: Box<dyn ProofVerifier>) -> StorageResult<Self> {
        config.validate()?;
        let curve = config.decay_curve()?;
        let split = config.treasury_split()?;
        let mut genesis = ShardState::genesis(config.minimum_diff, config.start_time);
        genesis.reward_pool = config.prepaid_amount;

        Ok(Self {
            space: ShardAddressSpace::from_config(&config),
            difficulty: config.difficulty_params(),
            curve,
            split,
            verifier,
            shards: vec![genesis],
            events: Vec::new(),
            balances: BTreeMap::new(),
            entries: BTreeMap::new(),
            idx_keys: Vec::new(),
            blobs,
            block_updates: (0, 0),
            config,
        })
    }

    /// Builds the ledger with a Groth16 verifier for the configured key.
    pub fn with_groth16(config: StorageConfig, blobs: B) -> StorageResult<Self> {
        let key = config
            .verifying_key
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("no decode-proof verifying key configured".to_string()))?;
        let verifier =
            Groth16Verifier::from_evm_key(key).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Self::new(config, blobs, Box::new(verifier))
    }

    // ==================== MUTATIONS ====================

    /// Stores `value` under `caller`'s `key` and returns its kvIdx.
    pub fn put(
        &mut self,
        ctx: &BlockContext,
        caller: H160,
        key: H256,
        value: Vec<u8>,
        payment: U256,
    ) -> StorageResult<u64> {
        let mut slots = self.put_batch(ctx, caller, vec![key], vec![value], payment)?;
        slots
            .pop()
            .ok_or_else(|| StorageError::InvalidInput("empty put".to_string()))
    }

    /// Stores all pairs or none. `payment` must cover one upfront payment per
    /// key that is not stored yet.
    pub fn put_batch(
        &mut self,
        ctx: &BlockContext,
        caller: H160,
        keys: Vec<H256>,
        values: Vec<Vec<u8>>,
        payment: U256,
    ) -> StorageResult<Vec<u64>> {
        if keys.is_empty() || keys.len() != values.len() {
            return Err(StorageError::InvalidInput(format!(
                "batch has {} keys and {} values",
                keys.len(),
                values.len()
            )));
        }
        let unique: BTreeSet<&H256> = keys.iter().collect();
        if unique.len() != keys.len() {
            return Err(StorageError::InvalidInput("duplicate key in batch".to_string()));
        }

        let max_size = self.config.max_kv_size();
        if let Some(value) = values.iter().find(|v| v.len() as u64 > max_size) {
            return Err(StorageError::Capacity(format!(
                "value of {} bytes exceeds the {}-byte slot",
                value.len(),
                max_size
            )));
        }

        let puts_in_block = self.puts_in_block(ctx.number);
        let limit = self.config.update_limit;
        if limit > 0 && puts_in_block + keys.len() as u64 > limit {
            return Err(StorageError::UpdateLimit {
                block: ctx.number,
                limit,
            });
        }

        let new_keys = keys
            .iter()
            .filter(|k| !self.entries.contains_key(&storage_key(caller, **k)))
            .count() as u64;
        let required = self
            .upfront_payment(ctx.timestamp)
            .checked_mul(U256::from(new_keys))
            .ok_or_else(|| StorageError::Payment {
                required: U256::MAX,
                provided: payment,
            })?;
        if payment < required {
            return Err(StorageError::Payment {
                required,
                provided: payment,
            });
        }

        if self.config.max_shards > 0 {
            let capacity = self.config.max_shards.saturating_mul(self.space.kvs_per_shard());
            if self.kv_entry_count() + new_keys > capacity {
                return Err(StorageError::Capacity(format!(
                    "ledger is full at {} slots",
                    capacity
                )));
            }
        }

        let mut slots = Vec::with_capacity(keys.len());
        for (key, value) in keys.into_iter().zip(values) {
            slots.push(self.write_entry(ctx, caller, key, value));
        }

        if let Some(&last) = slots.last() {
            let (fee, net) = self.split.split(payment);
            self.credit(self.config.treasury, fee);
            let shard = self.space.shard_of(last);
            self.ensure_shard(shard, ctx.timestamp);
            let state = &mut self.shards[shard as usize];
            state.reward_pool = state.reward_pool.saturating_add(net);
        }
        self.block_updates = (ctx.number, puts_in_block + slots.len() as u64);
        Ok(slots)
    }

    fn write_entry(&mut self, ctx: &BlockContext, owner: H160, key: H256, value: Vec<u8>) -> u64 {
        let skey = storage_key(owner, key);
        let root = merkle_root_min_tree(&value);
        let size = value.len() as u64;
        let kv_idx = match self.entries.get(&skey) {
            Some(entry) => entry.kv_idx,
            None => {
                let kv_idx = self.idx_keys.len() as u64;
                self.idx_keys.push(skey);
                self.ensure_shard(self.space.shard_of(kv_idx), ctx.timestamp);
                kv_idx
            }
        };
        self.entries.insert(skey, KvEntry { kv_idx, size, root });
        self.blobs.put_blob(skey, value);
        debug!(
            "put {:?} for {:?} at kvIdx {} ({} bytes, root {:?})",
            key, owner, kv_idx, size, root
        );
        self.events.push(StorageEvent::PutEntry {
            owner,
            key,
            kv_idx,
            size,
            root,
        });
        kv_idx
    }

    /// Removes `caller`'s `key` and refunds the caller.
    pub fn remove(&mut self, ctx: &BlockContext, caller: H160, key: H256) -> StorageResult<U256> {
        self.remove_to(ctx, caller, key, caller)
    }

    /// Removes `caller`'s `key` and refunds `recipient` the current upfront
    /// payment, bounded by what the slot's shard still holds.
    pub fn remove_to(
        &mut self,
        ctx: &BlockContext,
        caller: H160,
        key: H256,
        recipient: H160,
    ) -> StorageResult<U256> {
        let skey = storage_key(caller, key);
        let entry = self.entries.remove(&skey).ok_or(StorageError::NotFound(key))?;
        let last_kv_idx = self.idx_keys.len() as u64 - 1;
        if entry.kv_idx != last_kv_idx {
            let moved = self.idx_keys[last_kv_idx as usize];
            self.idx_keys[entry.kv_idx as usize] = moved;
            if let Some(moved_entry) = self.entries.get_mut(&moved) {
                moved_entry.kv_idx = entry.kv_idx;
            }
        }
        self.idx_keys.pop();
        self.blobs.remove_blob(&skey);

        let shard = self.space.shard_of(entry.kv_idx);
        self.ensure_shard(shard, ctx.timestamp);
        let state = &mut self.shards[shard as usize];
        let refund = self.curve.upfront_payment(ctx.timestamp).min(state.reward_pool);
        state.reward_pool -= refund;
        self.credit(recipient, refund);

        debug!(
            "removed {:?} of {:?} from kvIdx {} (slot {} moved in), refunded {} to {:?}",
            key, caller, entry.kv_idx, last_kv_idx, refund, recipient
        );
        self.events.push(StorageEvent::Remove {
            owner: caller,
            key,
            kv_idx: entry.kv_idx,
            last_kv_idx,
            refund,
            recipient,
        });
        Ok(refund)
    }

    /// Adds `amount` to the reward pool of the shard currently being filled.
    pub fn fund(&mut self, ctx: &BlockContext, amount: U256) {
        let shard = self.space.shard_of(self.kv_entry_count());
        self.ensure_shard(shard, ctx.timestamp);
        let state = &mut self.shards[shard as usize];
        state.reward_pool = state.reward_pool.saturating_add(amount);
        self.events.push(StorageEvent::Funded {
            shard_idx: shard,
            amount,
        });
    }

    pub(crate) fn credit(&mut self, account: H160, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let balance = self.balances.entry(account).or_insert_with(U256::zero);
        *balance = balance.saturating_add(amount);
    }

    pub(crate) fn ensure_shard(&mut self, shard: u64, now: u64) {
        while self.shards.len() as u64 <= shard {
            self.shards.push(ShardState::genesis(self.config.minimum_diff, now));
        }
    }

    fn puts_in_block(&self, block: u64) -> u64 {
        if self.block_updates.0 == block {
            self.block_updates.1
        } else {
            0
        }
    }

    // ==================== VIEWS ====================

    /// `length` bytes of `owner`'s value starting at byte
    /// `chunk_idx * 32 + byte_offset`, clipped to the value; empty for an
    /// unknown key.
    pub fn get(&self, owner: H160, key: &H256, chunk_idx: u64, byte_offset: u64, length: u64) -> Vec<u8> {
        let skey = storage_key(owner, *key);
        let Some(value) = self.entries.get(&skey).and_then(|_| self.blobs.get_blob(&skey)) else {
            return Vec::new();
        };
        let size = value.len() as u64;
        let start = chunk_idx
            .saturating_mul(WORD_SIZE as u64)
            .saturating_add(byte_offset)
            .min(size);
        let end = start.saturating_add(length).min(size);
        value[start as usize..end as usize].to_vec()
    }

    fn entry(&self, owner: H160, key: &H256) -> Option<&KvEntry> {
        self.entries.get(&storage_key(owner, *key))
    }

    pub fn exist(&self, owner: H160, key: &H256) -> bool {
        self.entry(owner, key).is_some()
    }

    /// Stored byte length, 0 for an unknown key.
    pub fn size(&self, owner: H160, key: &H256) -> u64 {
        self.entry(owner, key).map_or(0, |e| e.size)
    }

    /// Commitment root, zero for an unknown key.
    pub fn hash(&self, owner: H160, key: &H256) -> H256 {
        self.entry(owner, key).map_or_else(H256::zero, |e| e.root)
    }

    pub fn get_kv_idx(&self, owner: H160, key: &H256) -> Option<u64> {
        self.entry(owner, key).map(|e| e.kv_idx)
    }

    pub fn kv_entry_count(&self) -> u64 {
        self.idx_keys.len() as u64
    }

    /// Slot metadata by kvIdx.
    pub fn slot(&self, kv_idx: u64) -> Option<&KvEntry> {
        let key = self.idx_keys.get(usize::try_from(kv_idx).ok()?)?;
        self.entries.get(key)
    }

    /// Ledger key (see [`storage_key`]) held in slot `kv_idx`; this is also
    /// the key its bytes live under in the blob store.
    pub fn key_at(&self, kv_idx: u64) -> Option<H256> {
        self.idx_keys.get(usize::try_from(kv_idx).ok()?).copied()
    }

    /// Price of one new slot at `now`.
    pub fn upfront_payment(&self, now: u64) -> U256 {
        self.curve.upfront_payment(now)
    }

    pub fn start_time(&self) -> u64 {
        self.config.start_time
    }

    pub fn shard_state(&self, shard_idx: u64) -> Option<&ShardState> {
        self.shards.get(usize::try_from(shard_idx).ok()?)
    }

    /// Shards that can currently be mined.
    pub fn shard_count(&self) -> u64 {
        self.space.shard_count(self.kv_entry_count())
    }

    pub fn balance_of(&self, account: &H160) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    pub fn events(&self) -> &[StorageEvent] {
        &self.events
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn address_space(&self) -> &ShardAddressSpace {
        &self.space
    }

    pub fn blob_store(&self) -> &B {
        &self.blobs
    }
}
