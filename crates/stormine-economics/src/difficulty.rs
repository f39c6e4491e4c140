// MINING DIFFICULTY CONTROLLER
// Per-shard difficulty that tracks a target interval between successful mines
//
// SAFETY CONSTRAINTS:
// 1. A single adjustment never moves difficulty by more than old / divisor
// 2. Difficulty never drops below the configured minimum
// 3. Adjustment is integer-only and deterministic

use log::info;
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifficultyError {
    #[error("cutoff must be non-zero")]
    ZeroCutoff,
    #[error("difficulty adjustment divisor must be non-zero")]
    ZeroDivisor,
    #[error("minimum difficulty must be non-zero")]
    ZeroMinimum,
}

/// Difficulty control-loop parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Target seconds between successful mines of one shard
    pub cutoff: u64,
    /// Difficulty moves by at most `1 / diff_adj_divisor` per mine
    pub diff_adj_divisor: u64,
    pub minimum_diff: U256,
}

impl DifficultyParams {
    pub fn new(cutoff: u64, diff_adj_divisor: u64, minimum_diff: U256) -> Result<Self, DifficultyError> {
        let params = Self {
            cutoff,
            diff_adj_divisor,
            minimum_diff,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), DifficultyError> {
        if self.cutoff == 0 {
            return Err(DifficultyError::ZeroCutoff);
        }
        if self.diff_adj_divisor == 0 {
            return Err(DifficultyError::ZeroDivisor);
        }
        if self.minimum_diff.is_zero() {
            return Err(DifficultyError::ZeroMinimum);
        }
        Ok(())
    }

    /// Difficulty a mine `interval` seconds after the previous one must meet.
    ///
    /// `old + old * (cutoff - interval) / (cutoff * divisor)`, with the
    /// decrease side clamped to `old / divisor` and the result floored at
    /// `minimum_diff`.
    pub fn required_difficulty(&self, old: U256, interval: u64) -> U256 {
        let cutoff = self.cutoff.max(1);
        let divisor = self.diff_adj_divisor.max(1);
        let denominator = U512::from(cutoff) * U512::from(divisor);
        let max_step = old / U256::from(divisor);

        let next = if interval <= cutoff {
            let step = scaled_step(old, cutoff - interval, denominator).min(max_step);
            old.saturating_add(step)
        } else {
            let step = scaled_step(old, interval - cutoff, denominator).min(max_step);
            old - step
        };
        let next = next.max(self.minimum_diff);

        if next != old {
            info!(
                "difficulty adjusted {} -> {} (interval {}s, cutoff {}s)",
                old, next, interval, cutoff
            );
        }
        next
    }
}

fn scaled_step(old: U256, delta: u64, denominator: U512) -> U256 {
    let step = old.full_mul(U256::from(delta)) / denominator;
    U256::try_from(step).unwrap_or(U256::MAX)
}

/// Largest folded hash accepted at `difficulty`.
pub fn target_for(difficulty: U256) -> U256 {
    if difficulty.is_zero() {
        return U256::MAX;
    }
    U256::MAX / difficulty
}

/// Target check on a folded audit hash.
pub fn meets_target(hash: U256, difficulty: U256) -> bool {
    hash <= target_for(difficulty)
}
