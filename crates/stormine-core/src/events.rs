/// Ledger events, appended in execution order.

use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageEvent {
    PutEntry {
        owner: H160,
        key: H256,
        kv_idx: u64,
        size: u64,
        root: H256,
    },
    /// `last_kv_idx` is the slot that was moved into the freed `kv_idx`.
    Remove {
        owner: H160,
        key: H256,
        kv_idx: u64,
        last_kv_idx: u64,
        refund: U256,
        recipient: H160,
    },
    Funded {
        shard_idx: u64,
        amount: U256,
    },
    MinedBlock {
        shard_idx: u64,
        difficulty: U256,
        blocks_mined: u64,
        mine_time: u64,
        miner: H160,
        miner_reward: U256,
        treasury_fee: U256,
    },
}
