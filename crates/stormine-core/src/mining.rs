// PROOF-OF-STORAGE MINING
// Accepts a completed audit for one shard, pays the miner and retunes difficulty
//
// SAFETY CONSTRAINTS:
// 1. A mine is all-or-nothing: the outcome is computed against a read-only
//    ledger and written back only after every check has passed
// 2. The audit hash must meet the difficulty required at the mine timestamp
// 3. Payouts come out of the shard's reward pool and can never exceed it
// 4. Mine timestamps never move a shard's clock backwards

use log::{info, warn};
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use stormine_crypto::hash::h256_to_u256;
use stormine_economics::{meets_target, released_reward};

use crate::blob_store::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::events::StorageEvent;
use crate::kv_store::{BlockContext, StorageLedger};
use crate::randao::{mine_timestamp, randao_from_header, BlockHashOracle};
use crate::sampling::get_init_hash0;
use crate::shard::ShardState;

/// Everything a miner submits for one audit, apart from the seed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MiningSubmission {
    pub shard_idx: u64,
    pub miner: H160,
    pub nonce: u64,
    pub encoded_samples: Vec<H256>,
    pub masks: Vec<U256>,
    /// ABI-encoded inclusion proofs, one per sample
    pub inclusion_proofs: Vec<Vec<u8>>,
    /// ABI-encoded decode proofs, one per sample
    pub decode_proofs: Vec<Vec<u8>>,
}

/// Result of an accepted audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineOutcome {
    pub shard_idx: u64,
    pub init_hash0: H256,
    pub final_hash0: H256,
    pub mine_time: u64,
    /// Difficulty the audit was checked against, now the shard's difficulty
    pub difficulty: U256,
    pub miner_reward: U256,
    pub treasury_fee: U256,
    pub next_state: ShardState,
}

impl<B: BlobStore> StorageLedger<B> {
    /// Mines `submission` seeded by the randao of block `block_number`,
    /// whose RLP header the miner supplies.
    pub fn mine(
        &mut self,
        ctx: &BlockContext,
        oracle: &dyn BlockHashOracle,
        block_number: u64,
        header: &[u8],
        submission: &MiningSubmission,
    ) -> StorageResult<MineOutcome> {
        let block_hash = oracle.block_hash(block_number).ok_or_else(|| {
            StorageError::RandomnessMismatch(format!("hash of block {} is unavailable", block_number))
        })?;
        let randao = randao_from_header(header, block_hash)?;
        let mine_time = mine_timestamp(ctx.timestamp, ctx.number, block_number);
        let hash0 = get_init_hash0(randao, submission.miner, submission.nonce);
        self.mine_from(mine_time, hash0, submission)
    }

    /// Mines with a caller-chosen seed at the current timestamp. This skips
    /// the randomness binding and is meant for testing the audit path.
    pub fn mine_with_fixed_hash0(
        &mut self,
        ctx: &BlockContext,
        hash0: H256,
        submission: &MiningSubmission,
    ) -> StorageResult<MineOutcome> {
        self.mine_from(ctx.timestamp, hash0, submission)
    }

    fn mine_from(&mut self, mine_time: u64, hash0: H256, submission: &MiningSubmission) -> StorageResult<MineOutcome> {
        let outcome = self.evaluate_mine(mine_time, hash0, submission).map_err(|err| {
            warn!(
                "mine by {:?} on shard {} rejected: {}",
                submission.miner, submission.shard_idx, err
            );
            err
        })?;
        self.apply_mine(&outcome, submission.miner);
        Ok(outcome)
    }

    /// Runs every check of a mine and computes its outcome without touching
    /// ledger state.
    pub fn evaluate_mine(&self, mine_time: u64, hash0: H256, submission: &MiningSubmission) -> StorageResult<MineOutcome> {
        if submission.nonce >= self.config.nonce_limit {
            return Err(StorageError::NonceTooLarge {
                nonce: submission.nonce,
                limit: self.config.nonce_limit,
            });
        }

        let shard_idx = submission.shard_idx;
        if shard_idx >= self.shard_count() {
            return Err(StorageError::InvalidInput(format!(
                "shard {} is not open ({} shards)",
                shard_idx,
                self.shard_count()
            )));
        }
        let state = self
            .shard_state(shard_idx)
            .copied()
            .unwrap_or_else(|| ShardState::genesis(self.config.minimum_diff, mine_time));
        if mine_time < state.last_mine_time {
            return Err(StorageError::InvalidInput(format!(
                "mine time {} precedes the last mine at {}",
                mine_time, state.last_mine_time
            )));
        }

        let final_hash0 = self.verify_samples(
            shard_idx,
            hash0,
            submission.miner,
            &submission.encoded_samples,
            &submission.masks,
            &submission.inclusion_proofs,
            &submission.decode_proofs,
        )?;

        let interval = mine_time - state.last_mine_time;
        let difficulty = self.difficulty.required_difficulty(state.difficulty, interval);
        let hash = h256_to_u256(final_hash0);
        if !meets_target(hash, difficulty) {
            return Err(StorageError::Difficulty { hash, difficulty });
        }

        let reward = released_reward(state.reward_pool, self.config.dcf_factor, interval);
        let (treasury_fee, miner_reward) = self.split.split(reward);
        let next_state = ShardState {
            difficulty,
            last_mine_time: mine_time,
            reward_pool: state.reward_pool - reward,
            blocks_mined: state.blocks_mined + 1,
        };

        Ok(MineOutcome {
            shard_idx,
            init_hash0: hash0,
            final_hash0,
            mine_time,
            difficulty,
            miner_reward,
            treasury_fee,
            next_state,
        })
    }

    fn apply_mine(&mut self, outcome: &MineOutcome, miner: H160) {
        self.ensure_shard(outcome.shard_idx, outcome.mine_time);
        self.shards[outcome.shard_idx as usize] = outcome.next_state;
        self.credit(miner, outcome.miner_reward);
        self.credit(self.config.treasury, outcome.treasury_fee);

        info!(
            "shard {} mined by {:?} at {}: difficulty {}, reward {} (+{} to treasury)",
            outcome.shard_idx,
            miner,
            outcome.mine_time,
            outcome.difficulty,
            outcome.miner_reward,
            outcome.treasury_fee
        );
        self.events.push(StorageEvent::MinedBlock {
            shard_idx: outcome.shard_idx,
            difficulty: outcome.difficulty,
            blocks_mined: outcome.next_state.blocks_mined,
            mine_time: outcome.mine_time,
            miner,
            miner_reward: outcome.miner_reward,
            treasury_fee: outcome.treasury_fee,
        });
    }
}
