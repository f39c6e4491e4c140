//! Stormine
//!
//! Proof-of-storage mining for a decentralized key-value store. Clients pay
//! up front for slots in a sharded ledger; miners keep the data masked under
//! a per-miner key and earn the slot payments by passing random audits whose
//! hash meets each shard's difficulty.
//!
//! - [`ledger`]: the ledger, sampling engine and mining loop
//! - [`crypto`]: keccak words, Merkle commitments and decode-proof verification
//! - [`economics`]: decaying prices, difficulty control and reward release

pub use stormine_core as ledger;
pub use stormine_crypto as crypto;
pub use stormine_economics as economics;

pub use stormine_core::{
    BlockContext, MemoryBlobStore, MineOutcome, MiningSubmission, StorageConfig, StorageError,
    StorageLedger,
};
