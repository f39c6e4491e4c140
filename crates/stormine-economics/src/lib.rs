/// STORMINE ECONOMICS
///
/// The money and work side of storage mining:
/// - Storage is prepaid up front and the prepayment decays over time
/// - Miners draw down the decayed part of each shard's reward pool
/// - Difficulty tracks a target interval between successful mines
/// - A fixed basis-point share of every payment goes to the treasury
///
/// All arithmetic is integer-only on 256-bit words; fractional decay factors
/// are Q128.128 fixed point.

pub mod difficulty;
pub mod pricing;
pub mod rewards;

pub use difficulty::{meets_target, target_for, DifficultyError, DifficultyParams};
pub use pricing::{pow_q128, DecayCurve, PricingError, Q128_ONE};
pub use rewards::{released_reward, RewardError, TreasurySplit, BPS_DENOMINATOR};
