/// STORAGE CONFIGURATION
///
/// Immutable per-deployment parameters of the storage ledger: slot and shard
/// geometry, audit size, pricing curve, difficulty loop and treasury.
///
/// Sources are layered with the `config` crate: a YAML/TOML/JSON file first,
/// then `STORMINE_*` environment variables (e.g. `STORMINE_RANDOM_CHECKS=4`).
/// 256-bit amounts are written as decimal or `0x` hex strings.

use std::path::Path;

use config::{Config, Environment, File};
use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use stormine_crypto::field::DEFAULT_PRF_DOMAIN_BITS;
use stormine_crypto::EvmVerifyingKey;
use stormine_economics::{DecayCurve, DifficultyParams, TreasurySplit, BPS_DENOMINATOR, Q128_ONE};
use thiserror::Error;

/// log2 of the sample (chunk) size in bytes
pub const SAMPLE_SIZE_BITS: u32 = 5;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "STORMINE";

/// Two-adicity of the BN254 scalar field; evaluation domains cannot be larger.
const MAX_PRF_DOMAIN_BITS: u32 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// log2 of the largest value a slot may hold
    pub max_kv_size_bits: u32,
    /// log2 of a shard's byte capacity
    pub shard_size_bits: u32,
    /// Samples audited per mining attempt
    pub random_checks: usize,
    /// Target seconds between successful mines of a shard
    pub cutoff: u64,
    pub diff_adj_divisor: u64,
    /// Treasury share of every inflow and reward, in basis points
    pub treasury_share: u16,
    pub nonce_limit: u64,
    pub start_time: u64,
    #[serde(with = "u256_serde")]
    pub storage_cost: U256,
    /// Q128.128 per-second value retention
    #[serde(with = "u256_serde")]
    pub dcf_factor: U256,
    #[serde(with = "u256_serde")]
    pub minimum_diff: U256,
    #[serde(default)]
    pub treasury: H160,
    /// Genesis funding of shard 0's reward pool
    #[serde(default, with = "u256_serde")]
    pub prepaid_amount: U256,
    /// Max puts per block, 0 for unlimited
    #[serde(default)]
    pub update_limit: u64,
    /// Max shards the ledger may grow to, 0 for unlimited
    #[serde(default)]
    pub max_shards: u64,
    #[serde(default = "default_prf_domain_bits")]
    pub prf_domain_bits: u32,
    /// Decode-proof verifying key in EVM word layout
    #[serde(default)]
    pub verifying_key: Option<EvmVerifyingKey>,
}

fn default_prf_domain_bits() -> u32 {
    DEFAULT_PRF_DOMAIN_BITS
}

impl Default for StorageConfig {
    /// Mainnet-style parameters: 128 KiB slots, 2 TiB shards, two samples per
    /// attempt, a 3 hour cutoff and roughly 5% yearly discounting.
    fn default() -> Self {
        Self {
            max_kv_size_bits: 17,
            shard_size_bits: 41,
            random_checks: 2,
            cutoff: 10_800,
            diff_adj_divisor: 1024,
            treasury_share: 100,
            nonce_limit: 1 << 20,
            start_time: 0,
            storage_cost: U256::from(500_000_000_000_000u64),
            dcf_factor: U256::from(340_282_366_367_469_178_095_360_967_382_638_002_176u128),
            minimum_diff: U256::from(10_000_000u64),
            treasury: H160::zero(),
            prepaid_amount: U256::from(4_194_304_000_000_000_000_000u128),
            update_limit: 0,
            max_shards: 0,
            prf_domain_bits: DEFAULT_PRF_DOMAIN_BITS,
            verifying_key: None,
        }
    }
}

impl StorageConfig {
    /// Loads `path`, applies `STORMINE_*` overrides and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::finish(settings)
    }

    /// Defaults with `STORMINE_*` overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&Self::default()).map_err(|e| ConfigError::Load(e.to_string()))?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.max_kv_size_bits < SAMPLE_SIZE_BITS {
            return invalid(format!(
                "max_kv_size_bits {} is below the sample size bits {}",
                self.max_kv_size_bits, SAMPLE_SIZE_BITS
            ));
        }
        if self.shard_size_bits < self.max_kv_size_bits {
            return invalid(format!(
                "shard_size_bits {} is below max_kv_size_bits {}",
                self.shard_size_bits, self.max_kv_size_bits
            ));
        }
        if self.shard_size_bits > 64 {
            return invalid(format!("shard_size_bits {} exceeds 64", self.shard_size_bits));
        }
        if self.prf_domain_bits > MAX_PRF_DOMAIN_BITS || self.prf_domain_bits < self.sample_size_bits() {
            return invalid(format!(
                "prf_domain_bits {} must lie in [{}, {}]",
                self.prf_domain_bits,
                self.sample_size_bits(),
                MAX_PRF_DOMAIN_BITS
            ));
        }
        if self.random_checks == 0 {
            return invalid("random_checks must be non-zero".to_string());
        }
        if self.nonce_limit == 0 {
            return invalid("nonce_limit must be non-zero".to_string());
        }
        if self.treasury_share > BPS_DENOMINATOR {
            return invalid(format!(
                "treasury_share {} exceeds {} bps",
                self.treasury_share, BPS_DENOMINATOR
            ));
        }
        if self.dcf_factor > Q128_ONE {
            return invalid(format!("dcf_factor {} exceeds 1.0 (2^128)", self.dcf_factor));
        }
        self.difficulty_params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// log2 of samples per slot
    pub fn sample_size_bits(&self) -> u32 {
        self.max_kv_size_bits.saturating_sub(SAMPLE_SIZE_BITS)
    }

    /// log2 of slots per shard
    pub fn shard_entry_bits(&self) -> u32 {
        self.shard_size_bits.saturating_sub(self.max_kv_size_bits)
    }

    pub fn max_kv_size(&self) -> u64 {
        1u64 << self.max_kv_size_bits.min(63)
    }

    pub fn decay_curve(&self) -> Result<DecayCurve, ConfigError> {
        DecayCurve::new(self.storage_cost, self.dcf_factor, self.start_time)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn difficulty_params(&self) -> DifficultyParams {
        DifficultyParams {
            cutoff: self.cutoff,
            diff_adj_divisor: self.diff_adj_divisor,
            minimum_diff: self.minimum_diff,
        }
    }

    pub fn treasury_split(&self) -> Result<TreasurySplit, ConfigError> {
        TreasurySplit::new(self.treasury_share).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Parses a decimal or `0x`-prefixed hex integer.
pub fn parse_u256(input: &str) -> Result<U256, String> {
    let input = input.trim();
    match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(digits) => {
            U256::from_str_radix(digits, 16).map_err(|e| format!("invalid hex integer {:?}: {:?}", input, e))
        }
        None => U256::from_dec_str(input).map_err(|e| format!("invalid decimal integer {:?}: {:?}", input, e)),
    }
}

/// Serde adapter writing `U256` as a decimal string and reading decimal,
/// hex or plain integers.
pub mod u256_serde {
    use std::fmt;

    use primitive_types::U256;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        deserializer.deserialize_any(U256Visitor)
    }

    struct U256Visitor;

    impl<'de> Visitor<'de> for U256Visitor {
        type Value = U256;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal / 0x-hex string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
            Ok(U256::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<U256, E> {
            Ok(U256::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
            u64::try_from(v)
                .map(U256::from)
                .map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
            super::parse_u256(v).map_err(E::custom)
        }
    }
}
