/// Error taxonomy for ledger and mining operations. Every variant aborts the
/// enclosing call with no state mutation.

use primitive_types::{H256, U256};
use stormine_economics::{DifficultyError, PricingError, RewardError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("insufficient payment: required {required}, provided {provided}")]
    Payment { required: U256, provided: U256 },

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("key {0:?} not found")]
    NotFound(H256),

    #[error("sample {index} failed verification: {reason}")]
    ProofVerification { index: usize, reason: String },

    #[error("block randomness mismatch: {0}")]
    RandomnessMismatch(String),

    #[error("folded hash {hash:#x} misses the target for difficulty {difficulty}")]
    Difficulty { hash: U256, difficulty: U256 },

    #[error("nonce {nonce} is not below the limit {limit}")]
    NonceTooLarge { nonce: u64, limit: u64 },

    #[error("update limit of {limit} puts reached in block {block}")]
    UpdateLimit { block: u64, limit: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<PricingError> for StorageError {
    fn from(err: PricingError) -> Self {
        StorageError::Config(ConfigError::Invalid(err.to_string()))
    }
}

impl From<DifficultyError> for StorageError {
    fn from(err: DifficultyError) -> Self {
        StorageError::Config(ConfigError::Invalid(err.to_string()))
    }
}

impl From<RewardError> for StorageError {
    fn from(err: RewardError) -> Self {
        StorageError::Config(ConfigError::Invalid(err.to_string()))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
