//! Stormine storage-mining core
//!
//! A priced key-value ledger whose slots are audited by proof-of-storage
//! mining. Miners hold each value XOR-masked under a key unique to them,
//! and prove possession by sampling chunks along a hash chain seeded by
//! block randomness.

pub mod blob_store;
pub mod config;
pub mod encoding;
pub mod error;
pub mod events;
pub mod kv_store;
pub mod mining;
pub mod randao;
pub mod sampling;
pub mod shard;

pub use blob_store::{BlobStore, MemoryBlobStore};
pub use config::{ConfigError, StorageConfig};
pub use encoding::{encoding_key, truncate_root};
pub use error::{StorageError, StorageResult};
pub use events::StorageEvent;
pub use kv_store::{storage_key, BlockContext, KvEntry, StorageLedger};
pub use mining::{MineOutcome, MiningSubmission};
pub use randao::{BlockHashOracle, RecentBlockHashes};
pub use sampling::{get_init_hash0, get_next_hash0, SampleRound};
pub use shard::{SampleAddress, ShardAddressSpace, ShardState};

/// Version of the ledger rules implemented by this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
