//! The state database facade: per-account multi-asset ledger,
//! time-locked balances, notation registry, asset/swap/report
//! registries and the ticket set, all persisted through the
//! structured-storage codec of a handful of well-known system
//! accounts.
//!
//! The facade assumes an enclosing journal: callers take a snapshot
//! before applying a call and revert it when the call fails.

mod account;
mod registry;
mod storage;
mod ticket_cache;
mod tickets;

pub use account::Account;
pub use ticket_cache::{add_cached_tickets, cache_tickets, get_cached_tickets};

use crate::core::error::BlockchainError;
use primitive_types::U256;
use serde::Serialize;
use std::collections::HashMap;
use tempo_common::crypto::{Address, Hash};
use tempo_common::ticket::TicketsDataSlice;
use tempo_common::timelock::TimeLock;

/// Structured receipt log emitted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
    pub block_number: u64,
}

#[derive(Clone)]
struct Snapshot {
    accounts: HashMap<Address, Account>,
    tickets: Option<TicketsDataSlice>,
    logs_len: usize,
}

/// Versioned in-memory state. Trie persistence and the change journal
/// live outside the core; this facade exposes the same account-level
/// contract on top of plain maps plus explicit snapshots.
#[derive(Default)]
pub struct StateDB {
    accounts: HashMap<Address, Account>,
    tickets: Option<TicketsDataSlice>,
    logs: Vec<LogEntry>,
    snapshots: Vec<Snapshot>,
}

impl StateDB {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn account(&self, addr: &Address) -> Option<&Account> {
        self.accounts.get(addr)
    }

    pub(crate) fn account_mut(&mut self, addr: &Address) -> &mut Account {
        self.accounts.entry(*addr).or_default()
    }

    /// Explicit account creation. When an account already exists at
    /// the address its balances and time-lock balances are carried
    /// over; everything else starts fresh.
    pub fn create_account(&mut self, addr: &Address) {
        let prev = self.accounts.remove(addr);
        let mut fresh = Account::default();
        if let Some(prev) = prev {
            fresh.balances = prev.balances;
            fresh.timelock_balances = prev.timelock_balances;
        }
        self.accounts.insert(*addr, fresh);
    }

    // ----- plain balances -----

    pub fn get_balance(&self, asset_id: &Hash, addr: &Address) -> U256 {
        self.account(addr)
            .map(|acc| acc.balance(asset_id))
            .unwrap_or_default()
    }

    pub fn add_balance(&mut self, addr: &Address, asset_id: &Hash, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let account = self.account_mut(addr);
        let current = account.balance(asset_id);
        account.set_balance(*asset_id, current.saturating_add(amount));
    }

    /// Underflow is forbidden; the dispatcher pre-checks every debit.
    pub fn sub_balance(
        &mut self,
        addr: &Address,
        asset_id: &Hash,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.account_mut(addr);
        let current = account.balance(asset_id);
        let next = current
            .checked_sub(amount)
            .ok_or(BlockchainError::InsufficientAssetBalance)?;
        account.set_balance(*asset_id, next);
        Ok(())
    }

    pub fn set_balance(&mut self, addr: &Address, asset_id: &Hash, amount: U256) {
        self.account_mut(addr).set_balance(*asset_id, amount);
    }

    // ----- time-locked balances -----

    /// Returns a clone; mutation goes through add/sub/set.
    pub fn get_timelock_balance(&self, asset_id: &Hash, addr: &Address) -> TimeLock {
        self.account(addr)
            .map(|acc| acc.timelock_balance(asset_id))
            .unwrap_or_default()
    }

    pub fn add_timelock_balance(
        &mut self,
        addr: &Address,
        asset_id: &Hash,
        amount: &TimeLock,
        _height: u64,
        timestamp: u64,
    ) {
        if amount.is_empty() {
            return;
        }
        let account = self.account_mut(addr);
        let next = account
            .timelock_balance(asset_id)
            .add(amount)
            .clear_expired(timestamp);
        account.set_timelock_balance(*asset_id, next);
    }

    pub fn sub_timelock_balance(
        &mut self,
        addr: &Address,
        asset_id: &Hash,
        amount: &TimeLock,
        _height: u64,
        timestamp: u64,
    ) -> Result<(), BlockchainError> {
        if amount.is_empty() {
            return Ok(());
        }
        let account = self.account_mut(addr);
        let next = account
            .timelock_balance(asset_id)
            .sub(amount)
            .ok_or(BlockchainError::InsufficientTimeLockBalance)?
            .clear_expired(timestamp);
        account.set_timelock_balance(*asset_id, next);
        Ok(())
    }

    pub fn set_timelock_balance(&mut self, addr: &Address, asset_id: &Hash, amount: TimeLock) {
        self.account_mut(addr).set_timelock_balance(*asset_id, amount);
    }

    // ----- notation -----

    pub fn get_notation(&self, addr: &Address) -> u64 {
        self.account(addr).map(|acc| acc.notation).unwrap_or(0)
    }

    /// Assign the next notation to an account that has none.
    pub fn gen_notation(&mut self, addr: &Address) -> Result<(), BlockchainError> {
        let current = self.get_notation(addr);
        if current != 0 {
            return Err(BlockchainError::NotationExists {
                address: *addr,
                notation: current,
            });
        }
        let next = self.get_notation_count()? + 1;
        let display = calc_notation_display(next);
        self.set_notation_count(next);
        self.set_notation_lookup(display, addr);
        self.account_mut(addr).notation = display;
        Ok(())
    }

    /// Drop an account's notation and its reverse mapping.
    pub fn burn_notation(&mut self, addr: &Address) {
        let notation = self.get_notation(addr);
        if notation != 0 {
            self.set_notation_lookup(notation, &Address::zero());
            self.account_mut(addr).notation = 0;
        }
    }

    pub fn transfer_notation(
        &mut self,
        notation: u64,
        from: &Address,
        to: &Address,
    ) -> Result<(), BlockchainError> {
        let holder = self.get_address_by_notation(notation)?;
        if holder != *from {
            return Err(BlockchainError::NotationNotOwned);
        }
        // a previous notation of the receiver is burned, not transferred
        let old = self.get_notation(to);
        if old != 0 {
            self.set_notation_lookup(old, &Address::zero());
        }
        self.set_notation_lookup(notation, to);
        self.account_mut(to).notation = notation;
        self.account_mut(from).notation = 0;
        Ok(())
    }

    // ----- account drain -----

    /// Move everything an account owns to another account: live
    /// tickets are refunded to the receiver as time locks, the
    /// notation is burned, and every balance entry moves over.
    pub fn transfer_all(&mut self, from: &Address, to: &Address, height: u64, timestamp: u64) {
        if !self.accounts.contains_key(from) {
            return;
        }

        self.clear_tickets(from, to, height, timestamp);
        self.burn_notation(from);

        let account = self.account_mut(from);
        let balances: Vec<(Hash, U256)> = account.balances.drain(..).collect();
        let timelocks: Vec<(Hash, TimeLock)> = account.timelock_balances.drain(..).collect();

        for (asset_id, amount) in balances {
            self.add_balance(to, &asset_id, amount);
        }
        for (asset_id, amount) in timelocks {
            self.add_timelock_balance(to, &asset_id, &amount, height, timestamp);
        }
    }

    // ----- logs -----

    pub fn add_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    // ----- snapshots (journal stand-in) -----

    pub fn snapshot(&mut self) -> usize {
        self.snapshots.push(Snapshot {
            accounts: self.accounts.clone(),
            tickets: self.tickets.clone(),
            logs_len: self.logs.len(),
        });
        self.snapshots.len() - 1
    }

    pub fn revert_to_snapshot(&mut self, id: usize) {
        if id >= self.snapshots.len() {
            return;
        }
        let snapshot = self.snapshots.swap_remove(id);
        self.snapshots.truncate(id);
        self.accounts = snapshot.accounts;
        self.tickets = snapshot.tickets;
        self.logs.truncate(snapshot.logs_len);
    }

    pub fn discard_snapshot(&mut self, id: usize) {
        self.snapshots.truncate(id);
    }

    pub(crate) fn tickets_memo(&self) -> &Option<TicketsDataSlice> {
        &self.tickets
    }

    pub(crate) fn set_tickets_memo(&mut self, tickets: TicketsDataSlice) {
        self.tickets = Some(tickets);
    }
}

/// Display form of a notation: the raw counter with a two-digit
/// checksum suffix. The formula is historical and must not change.
pub fn calc_notation_display(notation: u64) -> u64 {
    if notation == 0 {
        return notation;
    }
    let check = (notation ^ 8192 ^ 13) % 100;
    notation * 100 + check
}
