use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use primitive_types::{H160, H256, U256};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use stormine_core::config::parse_u256;
use stormine_core::{encoding_key, get_init_hash0, get_next_hash0, ShardAddressSpace, StorageConfig};
use stormine_crypto::hash::parse_h256;
use stormine_crypto::merkle::chunk_count;
use stormine_crypto::merkle_root_min_tree;
use stormine_economics::target_for;

#[derive(Parser)]
#[command(name = "stormine-cli")]
#[command(about = "Stormine storage-mining toolbox", long_about = None)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON); defaults plus STORMINE_* variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    CheckConfig,

    /// Price of one new slot at a timestamp
    UpfrontPayment { timestamp: u64 },

    /// Map a hash0 to the sample it selects in a shard
    SampleAddress {
        shard: u64,
        #[arg(value_parser = h256_arg)]
        hash0: H256,
    },

    /// Seed of a mining attempt
    InitHash0 {
        #[arg(value_parser = h256_arg)]
        randao: H256,
        #[arg(value_parser = address_arg)]
        miner: H160,
        nonce: u64,
    },

    /// Absorb an encoded sample into the running hash
    NextHash0 {
        #[arg(value_parser = h256_arg)]
        hash0: H256,
        #[arg(value_parser = h256_arg)]
        encoded_sample: H256,
    },

    /// Key a miner masks a slot with
    EncodingKey {
        #[arg(value_parser = h256_arg)]
        root: H256,
        #[arg(value_parser = address_arg)]
        miner: H160,
        kv_idx: u64,
    },

    /// Commitment root of a file's contents
    MerkleRoot { file: PathBuf },

    /// Difficulty a shard requires after a mining interval
    RequiredDiff {
        #[arg(value_parser = u256_arg)]
        difficulty: U256,
        interval: u64,
    },
}

fn h256_arg(input: &str) -> Result<H256, String> {
    parse_h256(input).map_err(|e| e.to_string())
}

fn u256_arg(input: &str) -> Result<U256, String> {
    parse_u256(input)
}

fn address_arg(input: &str) -> Result<H160, String> {
    let bytes = hex::decode(input.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    if bytes.len() != 20 {
        return Err(format!("address must be 20 bytes, got {}", bytes.len()));
    }
    Ok(H160::from_slice(&bytes))
}

fn load_config(path: Option<&PathBuf>) -> Result<StorageConfig> {
    let config = match path {
        Some(path) => StorageConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => StorageConfig::from_env().context("loading configuration from the environment")?,
    };
    debug!("effective configuration: {:?}", config);
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    info!("stormine {}", stormine_core::version());

    let output = match cli.command {
        Commands::CheckConfig => {
            let config = load_config(cli.config.as_ref())?;
            serde_json::to_value(&config)?
        }
        Commands::UpfrontPayment { timestamp } => {
            let config = load_config(cli.config.as_ref())?;
            let curve = config.decay_curve()?;
            json!({
                "timestamp": timestamp,
                "upfront_payment": curve.upfront_payment(timestamp).to_string(),
            })
        }
        Commands::SampleAddress { shard, hash0 } => {
            let config = load_config(cli.config.as_ref())?;
            let addr = ShardAddressSpace::from_config(&config).sample_address(shard, hash0);
            json!({
                "global_sample_idx": addr.global_sample_idx,
                "kv_idx": addr.kv_idx,
                "sample_idx_in_kv": addr.sample_idx_in_kv,
            })
        }
        Commands::InitHash0 { randao, miner, nonce } => {
            json!({ "hash0": get_init_hash0(randao, miner, nonce) })
        }
        Commands::NextHash0 { hash0, encoded_sample } => {
            json!({ "hash0": get_next_hash0(hash0, encoded_sample) })
        }
        Commands::EncodingKey { root, miner, kv_idx } => {
            json!({ "encoding_key": encoding_key(root, miner, kv_idx) })
        }
        Commands::MerkleRoot { file } => {
            let data = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            json!({
                "size": data.len(),
                "chunks": chunk_count(data.len()),
                "root": merkle_root_min_tree(&data),
            })
        }
        Commands::RequiredDiff { difficulty, interval } => {
            let config = load_config(cli.config.as_ref())?;
            if difficulty.is_zero() {
                bail!("difficulty must be non-zero");
            }
            let required = config.difficulty_params().required_difficulty(difficulty, interval);
            json!({
                "difficulty": required.to_string(),
                "target": format!("{:#x}", target_for(required)),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
