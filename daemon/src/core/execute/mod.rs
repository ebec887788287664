//! The authoritative state-transition dispatcher: a total match over
//! the typed call tags. Every call appends a structured log entry —
//! on failure the entry carries the human reason under `"Error"` and
//! the caller reverts the state through its snapshot.

use crate::core::error::BlockchainError;
use crate::core::report::{check_adding_report, process_report};
use crate::core::state::{LogEntry, StateDB};
use log::debug;
use primitive_types::U256;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tempo_common::config::{
    is_hard_fork, is_private_swap_checking_enabled, is_report_enabled, is_smart_transfer_enabled,
    ticket_price, CALL_ADDRESS, OWNER_USAN_ASSET_ID, SYSTEM_ASSET_ID,
};
use tempo_common::crypto::{Address, Hash};
use tempo_common::swap::{check_swap_targets, MultiSwap, Swap};
use tempo_common::ticket::{ticket_id, TicketBody, TicketError};
use tempo_common::timelock::{
    is_whole_lifetime, new_time_lock, surplus_time_lock, whole_lifetime, TimeLock,
    TIMELOCK_FOREVER, TIMELOCK_NOW,
};
use tempo_common::transaction::payload::{
    AssetValueChangeParam, BuyTicketParam, CallFunc, CallParam, GenAssetParam, LockType,
    MakeMultiSwapParam, MakeSwapParam, ParamError, RecallMultiSwapParam, RecallSwapParam,
    SendAssetParam, TakeMultiSwapParam, TakeSwapParam, TimeLockParam,
};
use tempo_common::transaction::Transaction;

/// Execution context of the enclosing block. `timestamp` is the
/// parent block's time, so execution never depends on the current
/// proposer's clock; `parent_hash` seeds ticket ids.
#[derive(Debug, Clone)]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
    pub parent_hash: Hash,
}

/// Decode and apply the typed call carried by `msg`, without rollback
/// handling.
pub fn apply_native_call(
    state: &mut StateDB,
    env: &BlockEnv,
    from: Address,
    msg: &Transaction,
) -> Result<(), BlockchainError> {
    let param: CallParam = rlp::decode(&msg.data)?;
    StateTransition::new(state, env.clone(), from, msg).apply(&param)
}

/// Apply a typed call atomically: on error every mutation is reverted
/// and only the log entries survive (the failure log included).
pub fn execute_native_call(
    state: &mut StateDB,
    env: &BlockEnv,
    from: Address,
    msg: &Transaction,
) -> Result<(), BlockchainError> {
    let snapshot = state.snapshot();
    match apply_native_call(state, env, from, msg) {
        Ok(()) => {
            state.discard_snapshot(snapshot);
            Ok(())
        }
        Err(err) => {
            let logs: Vec<LogEntry> = state.logs().to_vec();
            state.revert_to_snapshot(snapshot);
            for entry in logs.into_iter().skip(state.logs().len()) {
                state.add_log(entry);
            }
            Err(err)
        }
    }
}

pub struct StateTransition<'a> {
    state: &'a mut StateDB,
    env: BlockEnv,
    from: Address,
    msg: &'a Transaction,
}

impl<'a> StateTransition<'a> {
    pub fn new(state: &'a mut StateDB, env: BlockEnv, from: Address, msg: &'a Transaction) -> Self {
        Self {
            state,
            env,
            from,
            msg,
        }
    }

    pub fn apply(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        match param.func {
            CallFunc::GenNotation => self.apply_gen_notation(param),
            CallFunc::GenAsset => self.apply_gen_asset(param),
            CallFunc::SendAsset => self.apply_send_asset(param),
            CallFunc::TimeLock => self.apply_time_lock(param),
            CallFunc::BuyTicket => self.apply_buy_ticket(param),
            CallFunc::AssetValueChange => self.apply_asset_value_change(param),
            CallFunc::MakeSwap | CallFunc::MakeSwapExt => self.apply_make_swap(param),
            CallFunc::RecallSwap => self.apply_recall_swap(param),
            CallFunc::TakeSwap | CallFunc::TakeSwapExt => self.apply_take_swap(param),
            CallFunc::MakeMultiSwap => self.apply_make_multi_swap(param),
            CallFunc::RecallMultiSwap => self.apply_recall_multi_swap(param),
            CallFunc::TakeMultiSwap => self.apply_take_multi_swap(param),
            CallFunc::ReportIllegal => self.apply_report_illegal(param),
            CallFunc::Empty => Err(BlockchainError::UnsupportedFunc),
        }
    }

    fn apply_gen_notation(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::GenNotation;
        if let Err(err) = self.state.gen_notation(&self.from) {
            return Err(self.fail(func, param, vec![], err));
        }
        let notation = self.state.get_notation(&self.from);
        self.add_log(func, param, &[("notation", json!(notation))]);
        Ok(())
    }

    fn apply_gen_asset(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::GenAsset;
        let p: GenAssetParam = rlp::decode(&param.data)?;
        if let Err(err) = p.check(self.env.number) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }
        let mut asset = p.to_asset();
        asset.id = self.msg.hash();
        asset.owner = self.from;
        let asset_id = asset.id;
        let total = asset.total;
        if let Err(err) = self.state.gen_asset(asset) {
            return Err(self.fail(func, &p, vec![], err));
        }
        self.state.add_balance(&self.from, &asset_id, total);
        self.add_log(func, &p, &[("AssetID", json!(asset_id))]);
        Ok(())
    }

    fn apply_send_asset(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::SendAsset;
        let p: SendAssetParam = rlp::decode(&param.data)?;
        if let Err(err) = p.check(self.env.number) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }
        if self.state.get_balance(&p.asset_id, &self.from) < p.value {
            return Err(self.fail(func, &p, vec![], BlockchainError::InsufficientAssetBalance));
        }
        self.state.sub_balance(&self.from, &p.asset_id, p.value)?;
        self.state.add_balance(&p.to, &p.asset_id, p.value);
        self.add_log(func, &p, &[("AssetID", json!(p.asset_id))]);
        Ok(())
    }

    fn apply_time_lock(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::TimeLock;
        let height = self.env.number;
        let timestamp = self.env.timestamp;
        let mut p: TimeLockParam = rlp::decode(&param.data)?;

        // releasing back to balance always releases the whole tail
        if p.lock_type == LockType::TimeLockToAsset {
            if p.start_time > timestamp {
                let extras = vec![("LockType", json!("TimeLockToAsset"))];
                return Err(self.fail(func, &p, extras, ParamError::StartTooLate.into()));
            }
            p.end_time = TIMELOCK_FOREVER;
        }
        if let Err(err) = p.check(height, timestamp) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }

        let start = p.start_time.max(timestamp);
        let end = p.end_time;
        let need = match new_time_lock(p.value, start, end) {
            Ok(need) => need,
            Err(err) => return Err(self.fail(func, &p, vec![], err.into())),
        };

        match p.lock_type {
            LockType::AssetToTimeLock => {
                if self.state.get_balance(&p.asset_id, &self.from) < p.value {
                    let extras = vec![("LockType", json!("AssetToTimeLock"))];
                    return Err(self.fail(
                        func,
                        &p,
                        extras,
                        BlockchainError::InsufficientAssetBalance,
                    ));
                }
                self.state.sub_balance(&self.from, &p.asset_id, p.value)?;

                let total = whole_lifetime(p.value, timestamp);
                if self.from == p.to {
                    self.state
                        .add_timelock_balance(&p.to, &p.asset_id, &total, height, timestamp);
                } else {
                    let surplus = total.sub(&need).unwrap_or_default();
                    if !surplus.is_empty() {
                        self.state.add_timelock_balance(
                            &self.from, &p.asset_id, &surplus, height, timestamp,
                        );
                    }
                    self.state
                        .add_timelock_balance(&p.to, &p.asset_id, &need, height, timestamp);
                }
                self.add_log(
                    func,
                    &p,
                    &[
                        ("LockType", json!("AssetToTimeLock")),
                        ("AssetID", json!(p.asset_id)),
                    ],
                );
                Ok(())
            }
            LockType::TimeLockToTimeLock => {
                if !self
                    .state
                    .get_timelock_balance(&p.asset_id, &self.from)
                    .covers(&need)
                {
                    let extras = vec![("LockType", json!("TimeLockToTimeLock"))];
                    return Err(self.fail(
                        func,
                        &p,
                        extras,
                        BlockchainError::InsufficientTimeLockBalance,
                    ));
                }
                self.state
                    .sub_timelock_balance(&self.from, &p.asset_id, &need, height, timestamp)?;
                self.state
                    .add_timelock_balance(&p.to, &p.asset_id, &need, height, timestamp);
                self.add_log(
                    func,
                    &p,
                    &[
                        ("LockType", json!("TimeLockToTimeLock")),
                        ("AssetID", json!(p.asset_id)),
                    ],
                );
                Ok(())
            }
            LockType::TimeLockToAsset => {
                if !self
                    .state
                    .get_timelock_balance(&p.asset_id, &self.from)
                    .covers(&need)
                {
                    let extras = vec![("LockType", json!("TimeLockToAsset"))];
                    return Err(self.fail(
                        func,
                        &p,
                        extras,
                        BlockchainError::InsufficientTimeLockBalance,
                    ));
                }
                self.state
                    .sub_timelock_balance(&self.from, &p.asset_id, &need, height, timestamp)?;
                self.state.add_balance(&p.to, &p.asset_id, p.value);
                self.add_log(
                    func,
                    &p,
                    &[
                        ("LockType", json!("TimeLockToAsset")),
                        ("AssetID", json!(p.asset_id)),
                    ],
                );
                Ok(())
            }
            LockType::SmartTransfer => {
                if !is_smart_transfer_enabled(height) {
                    let extras = vec![("LockType", json!("SmartTransfer"))];
                    return Err(self.fail(
                        func,
                        &p,
                        extras,
                        BlockchainError::NotEnabled("smart transfer"),
                    ));
                }
                let timelock_balance = self.state.get_timelock_balance(&p.asset_id, &self.from);
                if !timelock_balance.covers(&need) {
                    let timelock_value = timelock_balance.get_spendable_value(start, end);
                    let asset_balance = self.state.get_balance(&p.asset_id, &self.from);
                    if timelock_value.saturating_add(asset_balance) < p.value {
                        let extras = vec![("LockType", json!("SmartTransfer"))];
                        return Err(self.fail(
                            func,
                            &p,
                            extras,
                            BlockchainError::InsufficientBalance,
                        ));
                    }
                    if !timelock_value.is_zero() {
                        let partial = match new_time_lock(timelock_value, start, end) {
                            Ok(partial) => partial,
                            Err(err) => return Err(self.fail(func, &p, vec![], err.into())),
                        };
                        self.state.sub_timelock_balance(
                            &self.from, &p.asset_id, &partial, height, timestamp,
                        )?;
                    }
                    let use_asset_amount = p.value.saturating_sub(timelock_value);
                    self.state
                        .sub_balance(&self.from, &p.asset_id, use_asset_amount)?;
                    let surplus = surplus_time_lock(use_asset_amount, start, end, timestamp);
                    if !surplus.is_empty() {
                        self.state.add_timelock_balance(
                            &self.from, &p.asset_id, &surplus, height, timestamp,
                        );
                    }
                } else {
                    self.state
                        .sub_timelock_balance(&self.from, &p.asset_id, &need, height, timestamp)?;
                }

                if !is_whole_lifetime(start, end, timestamp) {
                    self.state
                        .add_timelock_balance(&p.to, &p.asset_id, &need, height, timestamp);
                } else {
                    self.state.add_balance(&p.to, &p.asset_id, p.value);
                }
                self.add_log(
                    func,
                    &p,
                    &[
                        ("LockType", json!("SmartTransfer")),
                        ("AssetID", json!(p.asset_id)),
                    ],
                );
                Ok(())
            }
        }
    }

    fn apply_buy_ticket(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::BuyTicket;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let id = ticket_id(&self.from, &self.env.parent_hash);
        if self.state.is_ticket_exist(&id) {
            return Err(self.fail(func, param, vec![], TicketError::Exists(id).into()));
        }

        let p: BuyTicketParam = rlp::decode(&param.data)?;
        let check_ts = if is_hard_fork(2, height) { timestamp } else { 0 };
        if let Err(err) = p.check(height, check_ts) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }

        let value = ticket_price(height);
        let need = match new_time_lock(value, p.start.max(timestamp), p.end) {
            Ok(need) => need,
            Err(err) => return Err(self.fail(func, &p, vec![], err.into())),
        };

        let ticket = TicketBody {
            id,
            height,
            start_time: p.start,
            expire_time: p.end,
        };

        let mut use_asset = false;
        if !self
            .state
            .get_timelock_balance(&SYSTEM_ASSET_ID, &self.from)
            .covers(&need)
        {
            if self.state.get_balance(&SYSTEM_ASSET_ID, &self.from) < value {
                return Err(self.fail(func, &p, vec![], BlockchainError::InsufficientMixedBalance));
            }
            use_asset = true;
        }

        if use_asset {
            self.state.sub_balance(&self.from, &SYSTEM_ASSET_ID, value)?;
            let surplus = whole_lifetime(value, timestamp).sub(&need).unwrap_or_default();
            if !surplus.is_empty() {
                self.state.add_timelock_balance(
                    &self.from,
                    &SYSTEM_ASSET_ID,
                    &surplus,
                    height,
                    timestamp,
                );
            }
        } else {
            self.state
                .sub_timelock_balance(&self.from, &SYSTEM_ASSET_ID, &need, height, timestamp)?;
        }

        if let Err(err) = self.state.add_ticket(self.from, ticket) {
            return Err(self.fail(func, &p, vec![], err));
        }
        self.add_log(
            func,
            &p,
            &[("TicketID", json!(id)), ("TicketOwner", json!(self.from))],
        );
        Ok(())
    }

    fn apply_asset_value_change(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::AssetValueChange;
        let p: AssetValueChangeParam = rlp::decode(&param.data)?;
        if let Err(err) = p.check(self.env.number) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }

        let mut asset = match self.state.get_asset(&p.asset_id) {
            Ok(asset) => asset,
            Err(err) => return Err(self.fail(func, &p, vec![], err)),
        };
        if !asset.can_change {
            return Err(self.fail(func, &p, vec![], BlockchainError::AssetNotChangeable));
        }
        if asset.owner != self.from {
            return Err(self.fail(func, &p, vec![], BlockchainError::NotAssetOwner));
        }
        if asset.owner != p.to && !p.is_inc {
            return Err(self.fail(func, &p, vec![], BlockchainError::DecrementNotOwnAccount));
        }

        if p.is_inc {
            self.state.add_balance(&p.to, &p.asset_id, p.value);
            asset.total = asset.total.saturating_add(p.value);
        } else {
            if self.state.get_balance(&p.asset_id, &p.to) < p.value {
                return Err(self.fail(func, &p, vec![], BlockchainError::InsufficientAssetBalance));
            }
            self.state.sub_balance(&p.to, &p.asset_id, p.value)?;
            asset.total = asset.total.saturating_sub(p.value);
        }
        if let Err(err) = self.state.update_asset(asset) {
            return Err(self.fail(func, &p, vec![], err));
        }
        self.add_log(func, &p, &[("AssetID", json!(p.asset_id))]);
        Ok(())
    }

    fn apply_make_swap(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::MakeSwap;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let notation = self.state.get_notation(&self.from);
        let mut p: MakeSwapParam = rlp::decode(&param.data)?;
        let swap_id = self.msg.hash();

        if self.state.get_swap(&swap_id).is_ok() {
            return Err(self.fail(func, &p, vec![], BlockchainError::SwapExists(swap_id)));
        }
        if let Err(err) = p.check(height, timestamp) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }
        if self.state.get_asset(&p.to_asset_id).is_err() {
            return Err(self.fail(func, &p, vec![], BlockchainError::AssetNotFound(p.to_asset_id)));
        }

        let usan = p.from_asset_id == OWNER_USAN_ASSET_ID;
        if usan {
            // a notation trade: one lot selling the maker's label
            if notation == 0 {
                return Err(self.fail(func, &p, vec![], BlockchainError::NoNotation));
            }
            p.min_from_amount = U256::one();
            p.swap_size = U256::one();
            p.from_start_time = TIMELOCK_NOW;
            p.from_end_time = TIMELOCK_FOREVER;
        }

        let total = p
            .min_from_amount
            .checked_mul(p.swap_size)
            .ok_or(BlockchainError::Overflow)?;
        let use_asset =
            p.from_start_time == TIMELOCK_NOW && p.from_end_time == TIMELOCK_FOREVER;
        let mut need = TimeLock::empty();
        if !usan && !use_asset {
            need = match new_time_lock(total, p.from_start_time.max(timestamp), p.from_end_time) {
                Ok(need) => need,
                Err(err) => return Err(self.fail(func, &p, vec![], err.into())),
            };
        }

        let swap = Swap {
            id: swap_id,
            owner: self.from,
            from_asset_id: p.from_asset_id,
            from_start_time: p.from_start_time,
            from_end_time: p.from_end_time,
            min_from_amount: p.min_from_amount,
            to_asset_id: p.to_asset_id,
            to_start_time: p.to_start_time,
            to_end_time: p.to_end_time,
            min_to_amount: p.min_to_amount,
            swap_size: p.swap_size,
            targets: p.targets.clone(),
            time: p.time,
            description: p.description.clone(),
            notation,
        };

        if usan {
            // no funds are locked for a notation trade
            if let Err(err) = self.state.add_swap(swap) {
                return Err(self.fail(func, &p, vec![], err));
            }
        } else {
            if use_asset {
                if self.state.get_balance(&p.from_asset_id, &self.from) < total {
                    return Err(self.fail(
                        func,
                        &p,
                        vec![],
                        BlockchainError::InsufficientAssetBalance,
                    ));
                }
            } else {
                let available = self.state.get_timelock_balance(&p.from_asset_id, &self.from);
                if !available.covers(&need) {
                    if param.func == CallFunc::MakeSwap {
                        // the legacy variant never tops up from balance
                        return Err(self.fail(
                            func,
                            &p,
                            vec![],
                            BlockchainError::InsufficientTimeLockBalance,
                        ));
                    }
                    if self.state.get_balance(&p.from_asset_id, &self.from) < total {
                        return Err(self.fail(
                            func,
                            &p,
                            vec![],
                            BlockchainError::InsufficientMixedBalance,
                        ));
                    }
                    self.state.sub_balance(&self.from, &p.from_asset_id, total)?;
                    let total_value = whole_lifetime(total, timestamp);
                    self.state.add_timelock_balance(
                        &self.from,
                        &p.from_asset_id,
                        &total_value,
                        height,
                        timestamp,
                    );
                }
            }

            if let Err(err) = self.state.add_swap(swap) {
                return Err(self.fail(func, &p, vec![], err));
            }

            // escrow the from side with the maker
            if use_asset {
                self.state.sub_balance(&self.from, &p.from_asset_id, total)?;
            } else {
                self.state.sub_timelock_balance(
                    &self.from,
                    &p.from_asset_id,
                    &need,
                    height,
                    timestamp,
                )?;
            }
        }
        self.add_log(func, &p, &[("SwapID", json!(swap_id))]);
        Ok(())
    }

    fn apply_recall_swap(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::RecallSwap;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let p: RecallSwapParam = rlp::decode(&param.data)?;
        let swap = match self.state.get_swap(&p.swap_id) {
            Ok(swap) => swap,
            Err(err) => return Err(self.fail(func, &p, vec![], err)),
        };
        if swap.owner != self.from {
            return Err(self.fail(func, &p, vec![], BlockchainError::NotSwapOwner));
        }
        if let Err(err) = self.state.remove_swap(&swap.id) {
            return Err(self.fail(func, &p, vec![], err));
        }

        // a notation trade never locked funds, so there is nothing to
        // give back
        if swap.from_asset_id != OWNER_USAN_ASSET_ID {
            let total = swap
                .min_from_amount
                .checked_mul(swap.swap_size)
                .ok_or(BlockchainError::Overflow)?;
            let use_asset =
                swap.from_start_time == TIMELOCK_NOW && swap.from_end_time == TIMELOCK_FOREVER;
            if use_asset {
                self.state.add_balance(&self.from, &swap.from_asset_id, total);
            } else if let Ok(need) = new_time_lock(
                total,
                swap.from_start_time.max(timestamp),
                swap.from_end_time,
            ) {
                self.state.add_timelock_balance(
                    &self.from,
                    &swap.from_asset_id,
                    &need,
                    height,
                    timestamp,
                );
            }
        }
        self.add_log(func, &p, &[("SwapID", json!(swap.id))]);
        Ok(())
    }

    fn apply_take_swap(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::TakeSwap;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let p: TakeSwapParam = rlp::decode(&param.data)?;
        let mut swap = match self.state.get_swap(&p.swap_id) {
            Ok(swap) => swap,
            Err(err) => return Err(self.fail(func, &p, vec![], err)),
        };
        if let Err(err) = p.check(height, &swap, timestamp) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }
        if is_private_swap_checking_enabled(height) {
            if let Err(err) = check_swap_targets(&swap.targets, &self.from) {
                return Err(self.fail(func, &p, vec![], err.into()));
            }
        }

        let usan_swap = swap.from_asset_id == OWNER_USAN_ASSET_ID;
        if usan_swap {
            let notation = self.state.get_notation(&swap.owner);
            if notation == 0 || notation != swap.notation {
                return Err(self.fail(func, &p, vec![], BlockchainError::NotationMismatch));
            }
        }

        let from_total = swap
            .min_from_amount
            .checked_mul(p.size)
            .ok_or(BlockchainError::Overflow)?;
        let from_use_asset =
            swap.from_start_time == TIMELOCK_NOW && swap.from_end_time == TIMELOCK_FOREVER;
        let to_total = swap
            .min_to_amount
            .checked_mul(p.size)
            .ok_or(BlockchainError::Overflow)?;
        let to_use_asset =
            swap.to_start_time == TIMELOCK_NOW && swap.to_end_time == TIMELOCK_FOREVER;

        let from_need = (!from_use_asset)
            .then(|| {
                new_time_lock(
                    from_total,
                    swap.from_start_time.max(timestamp),
                    swap.from_end_time,
                )
                .ok()
            })
            .flatten();
        let to_need = (!to_use_asset)
            .then(|| {
                new_time_lock(to_total, swap.to_start_time.max(timestamp), swap.to_end_time).ok()
            })
            .flatten();

        if to_use_asset {
            if self.state.get_balance(&swap.to_asset_id, &self.from) < to_total {
                return Err(self.fail(func, &p, vec![], BlockchainError::InsufficientAssetBalance));
            }
        } else if let Some(to_need) = &to_need {
            let available = self.state.get_timelock_balance(&swap.to_asset_id, &self.from);
            if !available.covers(to_need) {
                if param.func == CallFunc::TakeSwap {
                    // the legacy variant never tops up from balance
                    return Err(self.fail(
                        func,
                        &p,
                        vec![],
                        BlockchainError::InsufficientTimeLockBalance,
                    ));
                }
                if self.state.get_balance(&swap.to_asset_id, &self.from) < to_total {
                    return Err(self.fail(
                        func,
                        &p,
                        vec![],
                        BlockchainError::InsufficientMixedBalance,
                    ));
                }
                self.state.sub_balance(&self.from, &swap.to_asset_id, to_total)?;
                let total_value = whole_lifetime(to_total, timestamp);
                self.state.add_timelock_balance(
                    &self.from,
                    &swap.to_asset_id,
                    &total_value,
                    height,
                    timestamp,
                );
            }
        }

        let swap_deleted = if swap.swap_size == p.size {
            if let Err(err) = self.state.remove_swap(&swap.id) {
                return Err(self.fail(func, &p, vec![], err));
            }
            "true"
        } else {
            swap.swap_size = swap.swap_size.saturating_sub(p.size);
            if let Err(err) = self.state.update_swap(swap.clone()) {
                return Err(self.fail(func, &p, vec![], err));
            }
            "false"
        };

        // the taker pays the owner
        if to_use_asset {
            self.state.add_balance(&swap.owner, &swap.to_asset_id, to_total);
            self.state.sub_balance(&self.from, &swap.to_asset_id, to_total)?;
        } else if let Some(to_need) = &to_need {
            self.state
                .add_timelock_balance(&swap.owner, &swap.to_asset_id, to_need, height, timestamp);
            self.state.sub_timelock_balance(
                &self.from,
                &swap.to_asset_id,
                to_need,
                height,
                timestamp,
            )?;
        }

        // the taker is credited with the escrowed from side; the
        // owner's share was already taken at make time
        if usan_swap {
            if let Err(err) = self
                .state
                .transfer_notation(swap.notation, &swap.owner, &self.from)
            {
                return Err(self.fail(func, &p, vec![], err));
            }
        } else if from_use_asset {
            self.state.add_balance(&self.from, &swap.from_asset_id, from_total);
        } else if let Some(from_need) = &from_need {
            self.state.add_timelock_balance(
                &self.from,
                &swap.from_asset_id,
                from_need,
                height,
                timestamp,
            );
        }

        self.add_log(
            func,
            &p,
            &[("SwapID", json!(swap.id)), ("Deleted", json!(swap_deleted))],
        );
        Ok(())
    }

    fn apply_make_multi_swap(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::MakeMultiSwap;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let notation = self.state.get_notation(&self.from);
        let p: MakeMultiSwapParam = rlp::decode(&param.data)?;
        let swap_id = self.msg.hash();

        if self.state.get_swap(&swap_id).is_ok() {
            return Err(self.fail(func, &p, vec![], BlockchainError::SwapExists(swap_id)));
        }
        if let Err(err) = p.check(height, timestamp) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }
        for to_asset_id in &p.to_asset_ids {
            if self.state.get_asset(to_asset_id).is_err() {
                let err = BlockchainError::AssetNotFound(*to_asset_id);
                return Err(self.fail(func, &p, vec![], err));
            }
        }

        let ln = p.from_asset_ids.len();
        let mut use_asset = vec![false; ln];
        let mut total = vec![U256::zero(); ln];
        let mut need: Vec<Option<TimeLock>> = vec![None; ln];

        for i in 0..ln {
            total[i] = p.min_from_amounts[i]
                .checked_mul(p.swap_size)
                .ok_or(BlockchainError::Overflow)?;
            let start = p.from_start_times[i];
            let end = p.from_end_times[i];
            use_asset[i] = start == TIMELOCK_NOW && end == TIMELOCK_FOREVER;
            if !use_asset[i] {
                match new_time_lock(total[i], start.max(timestamp), end) {
                    Ok(lock) => need[i] = Some(lock),
                    Err(err) => return Err(self.fail(func, &p, vec![], err.into())),
                }
            }
        }

        let swap = MultiSwap {
            id: swap_id,
            owner: self.from,
            from_asset_ids: p.from_asset_ids.clone(),
            from_start_times: p.from_start_times.clone(),
            from_end_times: p.from_end_times.clone(),
            min_from_amounts: p.min_from_amounts.clone(),
            to_asset_ids: p.to_asset_ids.clone(),
            to_start_times: p.to_start_times.clone(),
            to_end_times: p.to_end_times.clone(),
            min_to_amounts: p.min_to_amounts.clone(),
            swap_size: p.swap_size,
            targets: p.targets.clone(),
            time: p.time,
            description: p.description.clone(),
            notation,
        };

        // first pass: simulate against copied balances, since several
        // legs may draw on the same asset
        let mut sim = SwapSimulation::default();
        for i in 0..ln {
            let asset_id = p.from_asset_ids[i];
            if use_asset[i] {
                let balance = sim.balance_mut(self.state, &self.from, &asset_id);
                if *balance < total[i] {
                    return Err(self.fail(
                        func,
                        &p,
                        vec![],
                        BlockchainError::InsufficientAssetBalance,
                    ));
                }
                *balance -= total[i];
            } else if let Some(need_i) = need[i].clone() {
                if !sim.timelock_mut(self.state, &self.from, &asset_id).covers(&need_i) {
                    let balance = sim.balance_mut(self.state, &self.from, &asset_id);
                    if *balance < total[i] {
                        return Err(self.fail(
                            func,
                            &p,
                            vec![],
                            BlockchainError::InsufficientMixedBalance,
                        ));
                    }
                    *balance -= total[i];
                    let lock = sim.timelock_mut(self.state, &self.from, &asset_id);
                    *lock = lock.add(&whole_lifetime(total[i], timestamp));
                }
                let lock = sim.timelock_mut(self.state, &self.from, &asset_id);
                *lock = lock.sub(&need_i).unwrap_or_default();
            }
        }

        // second pass: deduct for real
        let mut deduct_err = None;
        for i in 0..ln {
            let asset_id = p.from_asset_ids[i];
            if use_asset[i] {
                if self.state.get_balance(&asset_id, &self.from) < total[i] {
                    deduct_err = Some(BlockchainError::InsufficientAssetBalance);
                    break;
                }
                self.state.sub_balance(&self.from, &asset_id, total[i])?;
            } else if let Some(need_i) = &need[i] {
                let available = self.state.get_timelock_balance(&asset_id, &self.from);
                if !available.covers(need_i) {
                    if self.state.get_balance(&asset_id, &self.from) < total[i] {
                        deduct_err = Some(BlockchainError::InsufficientMixedBalance);
                        break;
                    }
                    self.state.sub_balance(&self.from, &asset_id, total[i])?;
                    let total_value = whole_lifetime(total[i], timestamp);
                    self.state.add_timelock_balance(
                        &self.from, &asset_id, &total_value, height, timestamp,
                    );
                }
                self.state
                    .sub_timelock_balance(&self.from, &asset_id, need_i, height, timestamp)?;
            }
        }
        if let Some(err) = deduct_err {
            debug!("make multi swap deduct failed after the balance pre-check");
            return Err(self.fail(func, &p, vec![], err));
        }

        if let Err(err) = self.state.add_multi_swap(swap) {
            return Err(self.fail(func, &p, vec![], err));
        }
        self.add_log(func, &p, &[("SwapID", json!(swap_id))]);
        Ok(())
    }

    fn apply_recall_multi_swap(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::RecallMultiSwap;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let p: RecallMultiSwapParam = rlp::decode(&param.data)?;
        let swap = match self.state.get_multi_swap(&p.swap_id) {
            Ok(swap) => swap,
            Err(err) => return Err(self.fail(func, &p, vec![], err)),
        };
        if swap.owner != self.from {
            return Err(self.fail(func, &p, vec![], BlockchainError::NotSwapOwner));
        }
        if let Err(err) = self.state.remove_multi_swap(&swap.id) {
            return Err(self.fail(func, &p, vec![], err));
        }

        for i in 0..swap.from_asset_ids.len() {
            let total = swap.min_from_amounts[i]
                .checked_mul(swap.swap_size)
                .ok_or(BlockchainError::Overflow)?;
            let start = swap.from_start_times[i];
            let end = swap.from_end_times[i];
            let use_asset = start == TIMELOCK_NOW && end == TIMELOCK_FOREVER;
            if use_asset {
                self.state
                    .add_balance(&self.from, &swap.from_asset_ids[i], total);
            } else if let Ok(need) = new_time_lock(total, start.max(timestamp), end) {
                self.state.add_timelock_balance(
                    &self.from,
                    &swap.from_asset_ids[i],
                    &need,
                    height,
                    timestamp,
                );
            }
        }
        self.add_log(func, &p, &[("SwapID", json!(swap.id))]);
        Ok(())
    }

    fn apply_take_multi_swap(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let func = CallFunc::TakeMultiSwap;
        let height = self.env.number;
        let timestamp = self.env.timestamp;

        let p: TakeMultiSwapParam = rlp::decode(&param.data)?;
        let mut swap = match self.state.get_multi_swap(&p.swap_id) {
            Ok(swap) => swap,
            Err(err) => return Err(self.fail(func, &p, vec![], err)),
        };
        if let Err(err) = p.check(height, &swap, timestamp) {
            return Err(self.fail(func, &p, vec![], err.into()));
        }
        if is_private_swap_checking_enabled(height) {
            if let Err(err) = check_swap_targets(&swap.targets, &self.from) {
                return Err(self.fail(func, &p, vec![], err.into()));
            }
        }

        let ln_from = swap.from_asset_ids.len();
        let mut from_use_asset = vec![false; ln_from];
        let mut from_total = vec![U256::zero(); ln_from];
        let mut from_need: Vec<Option<TimeLock>> = vec![None; ln_from];
        for i in 0..ln_from {
            from_total[i] = swap.min_from_amounts[i]
                .checked_mul(p.size)
                .ok_or(BlockchainError::Overflow)?;
            let start = swap.from_start_times[i];
            let end = swap.from_end_times[i];
            from_use_asset[i] = start == TIMELOCK_NOW && end == TIMELOCK_FOREVER;
            if !from_use_asset[i] {
                from_need[i] = new_time_lock(from_total[i], start.max(timestamp), end).ok();
            }
        }

        let ln_to = swap.to_asset_ids.len();
        let mut to_use_asset = vec![false; ln_to];
        let mut to_total = vec![U256::zero(); ln_to];
        let mut to_need: Vec<Option<TimeLock>> = vec![None; ln_to];
        for i in 0..ln_to {
            to_total[i] = swap.min_to_amounts[i]
                .checked_mul(p.size)
                .ok_or(BlockchainError::Overflow)?;
            let start = swap.to_start_times[i];
            let end = swap.to_end_times[i];
            to_use_asset[i] = start == TIMELOCK_NOW && end == TIMELOCK_FOREVER;
            if !to_use_asset[i] {
                to_need[i] = new_time_lock(to_total[i], start.max(timestamp), end).ok();
            }
        }

        // simulate the taker's payments before touching real state
        let mut sim = SwapSimulation::default();
        for i in 0..ln_to {
            let asset_id = swap.to_asset_ids[i];
            if to_use_asset[i] {
                let balance = sim.balance_mut(self.state, &self.from, &asset_id);
                if *balance < to_total[i] {
                    return Err(self.fail(
                        func,
                        &p,
                        vec![],
                        BlockchainError::InsufficientAssetBalance,
                    ));
                }
                *balance -= to_total[i];
            } else if let Some(need_i) = to_need[i].clone() {
                if !sim.timelock_mut(self.state, &self.from, &asset_id).covers(&need_i) {
                    let balance = sim.balance_mut(self.state, &self.from, &asset_id);
                    if *balance < to_total[i] {
                        return Err(self.fail(
                            func,
                            &p,
                            vec![],
                            BlockchainError::InsufficientMixedBalance,
                        ));
                    }
                    *balance -= to_total[i];
                    let lock = sim.timelock_mut(self.state, &self.from, &asset_id);
                    *lock = lock.add(&whole_lifetime(to_total[i], timestamp));
                }
                let lock = sim.timelock_mut(self.state, &self.from, &asset_id);
                *lock = lock.sub(&need_i).unwrap_or_default();
            }
        }

        // then deduct for real
        let mut deduct_err = None;
        for i in 0..ln_to {
            let asset_id = swap.to_asset_ids[i];
            if to_use_asset[i] {
                if self.state.get_balance(&asset_id, &self.from) < to_total[i] {
                    deduct_err = Some(BlockchainError::InsufficientAssetBalance);
                    break;
                }
                self.state.sub_balance(&self.from, &asset_id, to_total[i])?;
            } else if let Some(need_i) = &to_need[i] {
                let available = self.state.get_timelock_balance(&asset_id, &self.from);
                if !available.covers(need_i) {
                    if self.state.get_balance(&asset_id, &self.from) < to_total[i] {
                        deduct_err = Some(BlockchainError::InsufficientMixedBalance);
                        break;
                    }
                    self.state.sub_balance(&self.from, &asset_id, to_total[i])?;
                    let total_value = whole_lifetime(to_total[i], timestamp);
                    self.state.add_timelock_balance(
                        &self.from, &asset_id, &total_value, height, timestamp,
                    );
                }
                self.state
                    .sub_timelock_balance(&self.from, &asset_id, need_i, height, timestamp)?;
            }
        }
        if let Some(err) = deduct_err {
            debug!("take multi swap deduct failed after the balance pre-check");
            return Err(self.fail(func, &p, vec![], err));
        }

        let swap_deleted = if swap.swap_size == p.size {
            if let Err(err) = self.state.remove_multi_swap(&swap.id) {
                return Err(self.fail(func, &p, vec![], err));
            }
            "true"
        } else {
            swap.swap_size = swap.swap_size.saturating_sub(p.size);
            if let Err(err) = self.state.update_multi_swap(swap.clone()) {
                return Err(self.fail(func, &p, vec![], err));
            }
            "false"
        };

        // credit the owner with the to legs
        for i in 0..ln_to {
            if to_use_asset[i] {
                self.state
                    .add_balance(&swap.owner, &swap.to_asset_ids[i], to_total[i]);
            } else if let Some(need_i) = &to_need[i] {
                self.state.add_timelock_balance(
                    &swap.owner,
                    &swap.to_asset_ids[i],
                    need_i,
                    height,
                    timestamp,
                );
            }
        }

        // credit the taker with the escrowed from legs
        for i in 0..ln_from {
            if from_use_asset[i] {
                self.state
                    .add_balance(&self.from, &swap.from_asset_ids[i], from_total[i]);
            } else if let Some(need_i) = &from_need[i] {
                self.state.add_timelock_balance(
                    &self.from,
                    &swap.from_asset_ids[i],
                    need_i,
                    height,
                    timestamp,
                );
            }
        }

        self.add_log(
            func,
            &p,
            &[("SwapID", json!(swap.id)), ("Deleted", json!(swap_deleted))],
        );
        Ok(())
    }

    fn apply_report_illegal(&mut self, param: &CallParam) -> Result<(), BlockchainError> {
        let height = self.env.number;
        let timestamp = self.env.timestamp;
        if !is_report_enabled(height) {
            return Err(BlockchainError::NotEnabled("report"));
        }
        let (header1, header2) = check_adding_report(self.state, &param.data, Some(height))?;
        self.state.add_report(&param.data)?;
        let deleted = process_report(
            &header1,
            &header2,
            &self.from,
            self.state,
            height,
            timestamp,
        )?;

        let mut s = rlp::RlpStream::new();
        s.append_list(&deleted);
        let encoded = format!("0x{}", hex::encode(s.out()));
        self.add_log(
            CallFunc::ReportIllegal,
            &String::new(),
            &[("DeleteTickets", json!(encoded))],
        );
        debug!(
            "report illegal: reporter {}, double miner {} at height {}, {} tickets deleted",
            self.from,
            header1.miner,
            header1.number,
            deleted.len()
        );
        Ok(())
    }

    // ----- structured log -----

    fn add_log<T: Serialize>(&mut self, func: CallFunc, value: &T, extras: &[(&str, Value)]) {
        let mut map = match serde_json::to_value(value) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                let mut map = Map::new();
                map.insert("base".to_string(), other);
                map
            }
            Err(_) => Map::new(),
        };
        for (key, val) in extras {
            map.insert((*key).to_string(), val.clone());
        }
        let data = serde_json::to_vec(&Value::Object(map)).unwrap_or_default();

        let mut topic = [0u8; 32];
        topic[31] = func as u8;
        self.state.add_log(LogEntry {
            address: CALL_ADDRESS,
            topics: vec![Hash::new(topic)],
            data,
            block_number: self.env.number,
        });
    }

    fn fail<T: Serialize>(
        &mut self,
        func: CallFunc,
        value: &T,
        mut extras: Vec<(&'static str, Value)>,
        err: BlockchainError,
    ) -> BlockchainError {
        extras.push(("Error", Value::String(err.to_string())));
        self.add_log(func, value, &extras);
        err
    }
}

/// Scratch balances for multi-leg pre-checks: several legs may draw on
/// the same asset, so feasibility is simulated on copies first.
#[derive(Default)]
struct SwapSimulation {
    balances: HashMap<Hash, U256>,
    timelocks: HashMap<Hash, TimeLock>,
}

impl SwapSimulation {
    fn balance_mut(&mut self, state: &StateDB, addr: &Address, asset_id: &Hash) -> &mut U256 {
        self.balances
            .entry(*asset_id)
            .or_insert_with(|| state.get_balance(asset_id, addr))
    }

    fn timelock_mut(&mut self, state: &StateDB, addr: &Address, asset_id: &Hash) -> &mut TimeLock {
        self.timelocks
            .entry(*asset_id)
            .or_insert_with(|| state.get_timelock_balance(asset_id, addr))
    }
}
