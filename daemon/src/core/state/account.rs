use indexmap::IndexMap;
use primitive_types::U256;
use std::collections::HashMap;
use tempo_common::crypto::Hash;
use tempo_common::timelock::TimeLock;

/// Per-account state tracked by the ledger: multi-asset balances,
/// time-locked balances, the notation label, the raw data blob and the
/// structured-storage slots.
#[derive(Debug, Clone, Default)]
pub struct Account {
    pub balances: IndexMap<Hash, U256>,
    pub timelock_balances: IndexMap<Hash, TimeLock>,
    pub notation: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
    pub data_hash: Hash,
    pub storage: HashMap<Hash, Hash>,
}

impl Account {
    pub fn balance(&self, asset_id: &Hash) -> U256 {
        self.balances.get(asset_id).copied().unwrap_or_default()
    }

    pub fn timelock_balance(&self, asset_id: &Hash) -> TimeLock {
        self.timelock_balances
            .get(asset_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_balance(&mut self, asset_id: Hash, amount: U256) {
        self.balances.insert(asset_id, amount);
    }

    pub fn set_timelock_balance(&mut self, asset_id: Hash, amount: TimeLock) {
        self.timelock_balances.insert(asset_id, amount);
    }
}
