/// REWARD TREASURY
///
/// Every inflow (storage prepayment) and every outflow (mining reward) is
/// split in basis points between the treasury and the shard pool / miner.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{pow_q128, Q128_ONE};

/// 100% in basis points
pub const BPS_DENOMINATOR: u16 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("treasury share {0} bps exceeds 10000")]
    ShareOutOfRange(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySplit {
    share_bps: u16,
}

impl TreasurySplit {
    pub fn new(share_bps: u16) -> Result<Self, RewardError> {
        if share_bps > BPS_DENOMINATOR {
            return Err(RewardError::ShareOutOfRange(share_bps));
        }
        Ok(Self { share_bps })
    }

    pub fn share_bps(&self) -> u16 {
        self.share_bps
    }

    /// Splits `amount` into `(treasury, remainder)`; rounding favors the
    /// remainder.
    pub fn split(&self, amount: U256) -> (U256, U256) {
        let treasury = amount.full_mul(U256::from(self.share_bps)) / U256::from(BPS_DENOMINATOR);
        let treasury = U256::try_from(treasury).unwrap_or(amount).min(amount);
        (treasury, amount - treasury)
    }
}

/// Part of `pool` that has decayed over `interval` seconds at `dcf_factor`,
/// i.e. what a mine after that gap may pay out.
pub fn released_reward(pool: U256, dcf_factor: U256, interval: u64) -> U256 {
    let factor = pow_q128(dcf_factor.min(Q128_ONE), interval);
    let remaining = pool.full_mul(factor) >> 128;
    let remaining = U256::try_from(remaining).unwrap_or(pool).min(pool);
    pool - remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basis_points() {
        let split = TreasurySplit::new(100).unwrap();
        let (treasury, rest) = split.split(U256::from(1_000_000u64));
        assert_eq!(treasury, U256::from(10_000u64));
        assert_eq!(rest, U256::from(990_000u64));
    }

    #[test]
    fn test_split_rounds_toward_remainder() {
        let split = TreasurySplit::new(3).unwrap();
        assert_eq!(split.split(U256::from(100u64)), (U256::zero(), U256::from(100u64)));
    }

    #[test]
    fn test_full_and_zero_share() {
        let amount = U256::from(777u64);
        assert_eq!(TreasurySplit::new(0).unwrap().split(amount), (U256::zero(), amount));
        assert_eq!(
            TreasurySplit::new(BPS_DENOMINATOR).unwrap().split(amount),
            (amount, U256::zero())
        );
        assert_eq!(TreasurySplit::new(10_001), Err(RewardError::ShareOutOfRange(10_001)));
    }

    #[test]
    fn test_released_reward() {
        let pool = U256::exp10(18);
        let half = Q128_ONE >> 1;
        assert_eq!(released_reward(pool, half, 0), U256::zero());
        assert_eq!(released_reward(pool, half, 1), pool / 2);
        assert_eq!(released_reward(pool, half, 3), U256::from(875_000_000_000_000_000u64));
        assert_eq!(released_reward(pool, Q128_ONE, 1000), U256::zero());
    }
}
