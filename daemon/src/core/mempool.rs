//! Admission pre-validation for typed call transactions: reject a
//! transaction before it enters the pending pool when it cannot
//! possibly succeed under current state. Checks here are advisory —
//! they re-run every dispatcher parameter check against the *current*
//! head and wall-clock time, and never mutate state.

use crate::core::bridge::can_transfer_timelock;
use crate::core::error::BlockchainError;
use crate::core::report::check_adding_report;
use crate::core::state::StateDB;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::HashMap;
use tempo_common::block::BlockHeader;
use tempo_common::config::{
    call_fee, is_hard_fork, is_smart_transfer_enabled, ticket_price, OWNER_USAN_ASSET_ID,
    RECEIVE_ASSET_SELECTOR, SYSTEM_ASSET_ID,
};
use tempo_common::crypto::{Address, Hash};
use tempo_common::time::get_current_time_in_seconds;
use tempo_common::timelock::{
    new_time_lock, whole_lifetime, TimeLock, TIMELOCK_FOREVER, TIMELOCK_NOW,
};
use tempo_common::transaction::payload::{
    AssetValueChangeParam, BuyTicketParam, CallFunc, CallParam, GenAssetParam, LockType,
    MakeMultiSwapParam, MakeSwapParam, ParamError, RecallMultiSwapParam, RecallSwapParam,
    SendAssetParam, TakeMultiSwapParam, TakeSwapParam, TimeLockParam,
};
use tempo_common::transaction::{SendAssetFlag, Transaction, TransferTimeLockParam};

/// Minimum remaining lifetime of an inbound contract time lock.
const RECEIVE_ASSET_MIN_LIFETIME: u64 = 600;

struct PendingTx {
    from: Address,
    tx: Transaction,
}

/// The typed-call slice of the transaction pool. Signature validation
/// happens upstream; the sender arrives alongside the transaction.
#[derive(Default)]
pub struct Mempool {
    pending: Mutex<HashMap<Hash, PendingTx>>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.pending.lock().contains_key(hash)
    }

    pub fn remove(&self, hash: &Hash) -> bool {
        self.pending.lock().remove(hash).is_some()
    }

    /// Validate and admit a transaction, enforcing the pool-level
    /// uniqueness rules (one pending ticket purchase per sender, no
    /// duplicate reports).
    pub fn add_transaction(
        &self,
        state: &StateDB,
        head: &BlockHeader,
        from: Address,
        tx: Transaction,
    ) -> Result<(), BlockchainError> {
        self.add_transaction_at(state, head, from, tx, get_current_time_in_seconds())
    }

    pub fn add_transaction_at(
        &self,
        state: &StateDB,
        head: &BlockHeader,
        from: Address,
        tx: Transaction,
        now: u64,
    ) -> Result<(), BlockchainError> {
        self.validate_transaction_at(state, head, &from, &tx, now)?;

        let hash = tx.hash();
        if tx.is_buy_ticket() {
            let mut evict = None;
            {
                let pending = self.pending.lock();
                if pending.contains_key(&hash) {
                    return Err(BlockchainError::BuyTicketInPool);
                }
                for (old_hash, old) in pending.iter() {
                    if old.from == from && old.tx.is_buy_ticket() {
                        // always keep the latest purchase attempt
                        evict = Some(*old_hash);
                        break;
                    }
                }
            }
            if let Some(old_hash) = evict {
                self.remove(&old_hash);
            }
        }

        self.pending.lock().insert(hash, PendingTx { from, tx });
        Ok(())
    }

    /// Read-only feasibility check against current state, using
    /// wall-clock seconds for time-lock validity.
    pub fn validate_transaction(
        &self,
        state: &StateDB,
        head: &BlockHeader,
        from: &Address,
        tx: &Transaction,
    ) -> Result<(), BlockchainError> {
        self.validate_transaction_at(state, head, from, tx, get_current_time_in_seconds())
    }

    fn validate_transaction_at(
        &self,
        state: &StateDB,
        head: &BlockHeader,
        from: &Address,
        tx: &Transaction,
        now: u64,
    ) -> Result<(), BlockchainError> {
        let Some(to) = tx.to else {
            return Ok(()); // contract creation is not ours to police
        };
        if !tx.is_native_call() {
            return self.validate_receive_asset_payable(state, head, from, tx, now);
        }

        // parameter checks run height-agnostic in the pool; fork gates
        // use the next block number
        let height = u64::MAX;
        let next_block_number = head.number + 1;
        let timestamp = now;

        let param: CallParam = rlp::decode(&tx.data)?;
        let fee = call_fee(&to, param.func);
        let mut native_value = U256::zero();

        match param.func {
            CallFunc::GenNotation => {
                let notation = state.get_notation(from);
                if notation != 0 {
                    return Err(BlockchainError::NotationExists {
                        address: *from,
                        notation,
                    });
                }
            }
            CallFunc::GenAsset => {
                let p: GenAssetParam = rlp::decode(&param.data)?;
                p.check(height)?;
                let asset_id = tx.hash();
                if state.get_asset(&asset_id).is_ok() {
                    return Err(BlockchainError::AssetExists(asset_id));
                }
            }
            CallFunc::SendAsset => {
                let p: SendAssetParam = rlp::decode(&param.data)?;
                p.check(height)?;
                if p.asset_id == SYSTEM_ASSET_ID {
                    native_value = p.value;
                } else if state.get_balance(&p.asset_id, from) < p.value {
                    return Err(BlockchainError::InsufficientAssetBalance);
                }
            }
            CallFunc::TimeLock => {
                let mut p: TimeLockParam = rlp::decode(&param.data)?;
                if p.lock_type == LockType::TimeLockToAsset {
                    if p.start_time > timestamp {
                        return Err(ParamError::StartTooLate.into());
                    }
                    p.end_time = TIMELOCK_FOREVER;
                }
                if p.to.is_zero() {
                    return Err(ParamError::ZeroAddress.into());
                }
                p.check(height, timestamp)?;

                let start = p.start_time.max(timestamp);
                let end = p.end_time;
                let need = new_time_lock(p.value, start, end)?;
                match p.lock_type {
                    LockType::AssetToTimeLock => {
                        if p.asset_id == SYSTEM_ASSET_ID {
                            native_value = p.value;
                        } else if state.get_balance(&p.asset_id, from) < p.value {
                            return Err(BlockchainError::InsufficientAssetBalance);
                        }
                    }
                    LockType::TimeLockToTimeLock | LockType::TimeLockToAsset => {
                        if !state.get_timelock_balance(&p.asset_id, from).covers(&need) {
                            return Err(BlockchainError::InsufficientTimeLockBalance);
                        }
                    }
                    LockType::SmartTransfer => {
                        if !is_smart_transfer_enabled(next_block_number) {
                            return Err(BlockchainError::NotEnabled("smart transfer"));
                        }
                        let timelock_balance = state.get_timelock_balance(&p.asset_id, from);
                        if !timelock_balance.covers(&need) {
                            let timelock_value =
                                timelock_balance.get_spendable_value(start, end);
                            let asset_balance = state.get_balance(&p.asset_id, from);
                            if timelock_value.saturating_add(asset_balance) < p.value {
                                return Err(BlockchainError::InsufficientBalance);
                            }
                            native_value = p.value.saturating_sub(timelock_value);
                        }
                    }
                }
            }
            CallFunc::BuyTicket => {
                let p: BuyTicketParam = rlp::decode(&param.data)?;
                p.check(height, head.time)?;

                let value = ticket_price(height);
                let need = new_time_lock(value, p.start.max(timestamp), p.end)?;
                if !state
                    .get_timelock_balance(&SYSTEM_ASSET_ID, from)
                    .covers(&need)
                {
                    native_value = value;
                }
            }
            CallFunc::AssetValueChange => {
                let p: AssetValueChangeParam = rlp::decode(&param.data)?;
                p.check(height)?;

                let asset = state.get_asset(&p.asset_id)?;
                if !asset.can_change {
                    return Err(BlockchainError::AssetNotChangeable);
                }
                if asset.owner != *from {
                    return Err(BlockchainError::NotAssetOwner);
                }
                if asset.owner != p.to && !p.is_inc {
                    return Err(BlockchainError::DecrementNotOwnAccount);
                }
                if !p.is_inc && state.get_balance(&p.asset_id, &p.to) < p.value {
                    return Err(BlockchainError::InsufficientAssetBalance);
                }
            }
            CallFunc::Empty => {}
            CallFunc::MakeSwap | CallFunc::MakeSwapExt => {
                let p: MakeSwapParam = rlp::decode(&param.data)?;
                let swap_id = tx.hash();
                if state.get_swap(&swap_id).is_ok() {
                    return Err(BlockchainError::SwapExists(swap_id));
                }
                p.check(height, timestamp)?;
                if state.get_asset(&p.to_asset_id).is_err() {
                    return Err(BlockchainError::AssetNotFound(p.to_asset_id));
                }

                if p.from_asset_id == OWNER_USAN_ASSET_ID {
                    if state.get_notation(from) == 0 {
                        return Err(BlockchainError::NoNotation);
                    }
                } else {
                    let total = p
                        .min_from_amount
                        .checked_mul(p.swap_size)
                        .ok_or(BlockchainError::Overflow)?;
                    let use_asset = p.from_start_time == TIMELOCK_NOW
                        && p.from_end_time == TIMELOCK_FOREVER;
                    if use_asset {
                        if p.from_asset_id == SYSTEM_ASSET_ID {
                            native_value = total;
                        } else if state.get_balance(&p.from_asset_id, from) < total {
                            return Err(BlockchainError::InsufficientAssetBalance);
                        }
                    } else {
                        let need = new_time_lock(
                            total,
                            p.from_start_time.max(timestamp),
                            p.from_end_time,
                        )?;
                        if !state
                            .get_timelock_balance(&p.from_asset_id, from)
                            .covers(&need)
                        {
                            if param.func == CallFunc::MakeSwap {
                                // the legacy variant never tops up from balance
                                return Err(BlockchainError::InsufficientTimeLockBalance);
                            }
                            if p.from_asset_id == SYSTEM_ASSET_ID {
                                native_value = total;
                            } else if state.get_balance(&p.from_asset_id, from) < total {
                                return Err(BlockchainError::InsufficientMixedBalance);
                            }
                        }
                    }
                }
            }
            CallFunc::RecallSwap => {
                let p: RecallSwapParam = rlp::decode(&param.data)?;
                let swap = state.get_swap(&p.swap_id)?;
                if swap.owner != *from {
                    return Err(BlockchainError::NotSwapOwner);
                }
            }
            CallFunc::TakeSwap | CallFunc::TakeSwapExt => {
                let p: TakeSwapParam = rlp::decode(&param.data)?;
                let swap = state.get_swap(&p.swap_id)?;
                p.check(height, &swap, timestamp)?;
                tempo_common::swap::check_swap_targets(&swap.targets, from)?;

                if swap.from_asset_id == OWNER_USAN_ASSET_ID {
                    let notation = state.get_notation(&swap.owner);
                    if notation == 0 || notation != swap.notation {
                        return Err(BlockchainError::NotationMismatch);
                    }
                }

                let to_total = swap
                    .min_to_amount
                    .checked_mul(p.size)
                    .ok_or(BlockchainError::Overflow)?;
                let to_use_asset =
                    swap.to_start_time == TIMELOCK_NOW && swap.to_end_time == TIMELOCK_FOREVER;
                if to_use_asset {
                    if swap.to_asset_id == SYSTEM_ASSET_ID {
                        native_value = to_total;
                    } else if state.get_balance(&swap.to_asset_id, from) < to_total {
                        return Err(BlockchainError::InsufficientAssetBalance);
                    }
                } else if let Ok(to_need) = new_time_lock(
                    to_total,
                    swap.to_start_time.max(timestamp),
                    swap.to_end_time,
                ) {
                    if !state
                        .get_timelock_balance(&swap.to_asset_id, from)
                        .covers(&to_need)
                    {
                        if param.func == CallFunc::TakeSwap {
                            return Err(BlockchainError::InsufficientTimeLockBalance);
                        }
                        if swap.to_asset_id == SYSTEM_ASSET_ID {
                            native_value = to_total;
                        } else if state.get_balance(&swap.to_asset_id, from) < to_total {
                            return Err(BlockchainError::InsufficientMixedBalance);
                        }
                    }
                }
            }
            CallFunc::RecallMultiSwap => {
                let p: RecallMultiSwapParam = rlp::decode(&param.data)?;
                let swap = state.get_multi_swap(&p.swap_id)?;
                if swap.owner != *from {
                    return Err(BlockchainError::NotSwapOwner);
                }
            }
            CallFunc::MakeMultiSwap => {
                let p: MakeMultiSwapParam = rlp::decode(&param.data)?;
                let swap_id = tx.hash();
                if state.get_swap(&swap_id).is_ok() {
                    return Err(BlockchainError::SwapExists(swap_id));
                }
                p.check(height, timestamp)?;
                for to_asset_id in &p.to_asset_ids {
                    if state.get_asset(to_asset_id).is_err() {
                        return Err(BlockchainError::AssetNotFound(*to_asset_id));
                    }
                }
                native_value = simulate_maker_legs(
                    state,
                    from,
                    &p.from_asset_ids,
                    &p.from_start_times,
                    &p.from_end_times,
                    &p.min_from_amounts,
                    p.swap_size,
                    timestamp,
                )?;
            }
            CallFunc::TakeMultiSwap => {
                let p: TakeMultiSwapParam = rlp::decode(&param.data)?;
                let swap = state.get_multi_swap(&p.swap_id)?;
                p.check(height, &swap, timestamp)?;
                tempo_common::swap::check_swap_targets(&swap.targets, from)?;

                native_value = simulate_maker_legs(
                    state,
                    from,
                    &swap.to_asset_ids,
                    &swap.to_start_times,
                    &swap.to_end_times,
                    &swap.min_to_amounts,
                    p.size,
                    timestamp,
                )?;
            }
            CallFunc::ReportIllegal => {
                check_adding_report(state, &param.data, None)?;
                let pending = self.pending.lock();
                for (old_hash, old) in pending.iter() {
                    if *old_hash == tx.hash() {
                        continue;
                    }
                    if let Some(old_param) = old.tx.call_param() {
                        if old_param.func == CallFunc::ReportIllegal
                            && old_param.data == param.data
                        {
                            return Err(BlockchainError::ReportInPool);
                        }
                    }
                }
            }
        }

        // the native coin must cover gas, the fixed call fee and every
        // native-asset flow of the call itself
        let need = tx
            .gas_value()
            .saturating_add(fee)
            .saturating_add(native_value);
        let have = state.get_balance(&SYSTEM_ASSET_ID, from);
        if have < need {
            return Err(BlockchainError::InsufficientFunds { have, need });
        }
        Ok(())
    }

    /// A plain transfer to a contract may encode an inbound
    /// time-locked transfer; validate affordability with a padded
    /// minimum lifetime.
    fn validate_receive_asset_payable(
        &self,
        state: &StateDB,
        head: &BlockHeader,
        from: &Address,
        tx: &Transaction,
        now: u64,
    ) -> Result<(), BlockchainError> {
        let Some(to) = tx.to else {
            return Ok(());
        };
        let next_block_number = head.number + 1;
        if !is_receive_asset_payable_input(next_block_number, &tx.data) {
            return Ok(());
        }
        if state.get_data(&to).is_empty() {
            return Err(BlockchainError::ReceiverMustBeContract);
        }

        let mut p = parse_receive_asset_input(&tx.data, now + RECEIVE_ASSET_MIN_LIFETIME)?;
        p.timestamp = now;
        p.value = tx.value;
        p.gas_value = tx.gas_value();
        p.block_number = next_block_number;
        if !can_transfer_timelock(state, from, &p) {
            let have = state.get_balance(&SYSTEM_ASSET_ID, from);
            return Err(BlockchainError::InsufficientFunds {
                have,
                need: p.value.saturating_add(p.gas_value),
            });
        }
        Ok(())
    }
}

/// Shared feasibility walk over the legs a sender must fund, mirroring
/// the dispatcher's two-phase check against copied balances. Returns
/// the native-asset value the transaction would consume.
fn simulate_maker_legs(
    state: &StateDB,
    from: &Address,
    asset_ids: &[Hash],
    start_times: &[u64],
    end_times: &[u64],
    min_amounts: &[U256],
    size: U256,
    timestamp: u64,
) -> Result<U256, BlockchainError> {
    let mut native_value = U256::zero();
    let mut balances: HashMap<Hash, U256> = HashMap::new();
    let mut timelocks: HashMap<Hash, TimeLock> = HashMap::new();

    for i in 0..asset_ids.len() {
        let asset_id = asset_ids[i];
        let total = min_amounts[i]
            .checked_mul(size)
            .ok_or(BlockchainError::Overflow)?;
        let use_asset = start_times[i] == TIMELOCK_NOW && end_times[i] == TIMELOCK_FOREVER;

        let balance = balances
            .entry(asset_id)
            .or_insert_with(|| state.get_balance(&asset_id, from));
        if use_asset {
            if *balance < total {
                return Err(BlockchainError::InsufficientAssetBalance);
            }
            *balance -= total;
            if asset_id == SYSTEM_ASSET_ID {
                native_value = native_value.saturating_add(total);
            }
            continue;
        }

        let Ok(need) = new_time_lock(total, start_times[i].max(timestamp), end_times[i]) else {
            continue;
        };
        let lock = timelocks
            .entry(asset_id)
            .or_insert_with(|| state.get_timelock_balance(&asset_id, from));
        if !lock.covers(&need) {
            if *balance < total {
                return Err(BlockchainError::InsufficientMixedBalance);
            }
            *balance -= total;
            if asset_id == SYSTEM_ASSET_ID {
                native_value = native_value.saturating_add(total);
            }
            *lock = lock.add(&whole_lifetime(total, timestamp));
        }
        *lock = lock.sub(&need).unwrap_or_default();
    }
    Ok(native_value)
}

fn is_receive_asset_payable_input(height: u64, input: &[u8]) -> bool {
    is_hard_fork(2, height)
        && input.len() == 4 + 3 * 32
        && input[0..4] == RECEIVE_ASSET_SELECTOR
}

fn parse_receive_asset_input(
    input: &[u8],
    min_end_time: u64,
) -> Result<TransferTimeLockParam, BlockchainError> {
    let read_u64 = |word: &[u8]| -> Result<u64, BlockchainError> {
        if word[..24].iter().any(|b| *b != 0) {
            return Err(BlockchainError::ValueOverflow);
        }
        Ok(u64::from_be_bytes([
            word[24], word[25], word[26], word[27], word[28], word[29], word[30], word[31],
        ]))
    };
    let start = read_u64(&input[4..36])?;
    let mut end = read_u64(&input[36..68])?;
    let flag_raw = read_u64(&input[68..100])?;
    let flag = SendAssetFlag::from_u64(flag_raw).ok_or(BlockchainError::InvalidSendAssetFlag)?;

    if end == 0 {
        end = TIMELOCK_FOREVER;
    }
    if start > end {
        return Err(BlockchainError::WrongTimeRange);
    }
    if end < min_end_time {
        return Err(ParamError::AlreadyExpired.into());
    }

    Ok(TransferTimeLockParam {
        asset_id: SYSTEM_ASSET_ID,
        start_time: start,
        end_time: end,
        timestamp: 0,
        flag,
        value: U256::zero(),
        gas_value: U256::zero(),
        block_number: 0,
        is_receive: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_common::config::{coin, CALL_ADDRESS};

    fn head(number: u64, time: u64) -> BlockHeader {
        BlockHeader {
            parent_hash: Hash::repeat_byte(0x01),
            miner: Address::repeat_byte(0x02),
            number,
            time,
            extra: vec![],
        }
    }

    fn call_tx(nonce: u64, func: CallFunc, data: Vec<u8>) -> Transaction {
        let param = CallParam { func, data };
        Transaction {
            nonce,
            gas_price: U256::one(),
            gas_limit: 21_000,
            to: Some(CALL_ADDRESS),
            value: U256::zero(),
            data: rlp::encode(&param).to_vec(),
        }
    }

    #[test]
    fn test_gen_notation_affordability() {
        let pool = Mempool::new();
        let state = StateDB::new();
        let from = Address::repeat_byte(0x0a);
        let tx = call_tx(0, CallFunc::GenNotation, vec![]);

        // no balance at all: gas + fee unaffordable
        let err = pool
            .add_transaction_at(&state, &head(10, 1_000), from, tx.clone(), 1_000)
            .unwrap_err();
        assert!(matches!(err, BlockchainError::InsufficientFunds { .. }));

        let mut funded = StateDB::new();
        funded.add_balance(&from, &SYSTEM_ASSET_ID, coin());
        pool.add_transaction_at(&funded, &head(10, 1_000), from, tx, 1_000)
            .expect("admitted");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_existing_notation_rejected() {
        let pool = Mempool::new();
        let mut state = StateDB::new();
        let from = Address::repeat_byte(0x0a);
        state.add_balance(&from, &SYSTEM_ASSET_ID, coin());
        state.gen_notation(&from).expect("notation");

        let tx = call_tx(0, CallFunc::GenNotation, vec![]);
        let err = pool
            .add_transaction_at(&state, &head(10, 1_000), from, tx, 1_000)
            .unwrap_err();
        assert!(matches!(err, BlockchainError::NotationExists { .. }));
    }

    #[test]
    fn test_buy_ticket_uniqueness_evicts_older() {
        let pool = Mempool::new();
        let mut state = StateDB::new();
        let from = Address::repeat_byte(0x0a);
        state.add_balance(&from, &SYSTEM_ASSET_ID, ticket_price(1) * 10);

        let p = BuyTicketParam {
            start: 1_200,
            end: 9_000,
        };
        let older = call_tx(0, CallFunc::BuyTicket, rlp::encode(&p).to_vec());
        let newer = call_tx(1, CallFunc::BuyTicket, rlp::encode(&p).to_vec());
        let older_hash = older.hash();
        let newer_hash = newer.hash();

        pool.add_transaction_at(&state, &head(10, 1_000), from, older, 1_000)
            .expect("admitted");
        // re-submitting the identical purchase is rejected
        let dup = call_tx(0, CallFunc::BuyTicket, rlp::encode(&p).to_vec());
        assert!(matches!(
            pool.add_transaction_at(&state, &head(10, 1_000), from, dup, 1_000),
            Err(BlockchainError::BuyTicketInPool)
        ));

        // a newer purchase evicts the older one
        pool.add_transaction_at(&state, &head(10, 1_000), from, newer, 1_000)
            .expect("admitted");
        assert!(!pool.contains(&older_hash));
        assert!(pool.contains(&newer_hash));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_send_asset_counts_native_value() {
        let pool = Mempool::new();
        let mut state = StateDB::new();
        let from = Address::repeat_byte(0x0a);
        state.add_balance(&from, &SYSTEM_ASSET_ID, U256::from(100_000u64));

        let p = SendAssetParam {
            asset_id: SYSTEM_ASSET_ID,
            to: Address::repeat_byte(0x0b),
            value: U256::from(90_000u64),
        };
        let tx = call_tx(0, CallFunc::SendAsset, rlp::encode(&p).to_vec());
        // 90_000 value + 21_000 gas exceeds the 100_000 balance
        let err = pool
            .validate_transaction_at(&state, &head(10, 1_000), &from, &tx, 1_000)
            .unwrap_err();
        assert!(matches!(err, BlockchainError::InsufficientFunds { .. }));

        // other assets do not consume the gas-paying balance
        let other = Hash::repeat_byte(0x0c);
        state.add_balance(&from, &other, U256::from(90_000u64));
        let p = SendAssetParam {
            asset_id: other,
            to: Address::repeat_byte(0x0b),
            value: U256::from(90_000u64),
        };
        let tx = call_tx(1, CallFunc::SendAsset, rlp::encode(&p).to_vec());
        pool.validate_transaction_at(&state, &head(10, 1_000), &from, &tx, 1_000)
            .expect("affordable");
    }

    #[test]
    fn test_duplicate_report_in_pool_rejected() {
        use crate::core::report::encode_report;
        use tempo_common::block::BlockHeader as Header;

        let pool = Mempool::new();
        let mut state = StateDB::new();
        let from = Address::repeat_byte(0x0a);
        let other = Address::repeat_byte(0x0b);
        state.add_balance(&from, &SYSTEM_ASSET_ID, coin());
        state.add_balance(&other, &SYSTEM_ASSET_ID, coin());

        let h1 = Header {
            parent_hash: Hash::repeat_byte(0x01),
            miner: Address::repeat_byte(0x05),
            number: 9,
            time: 900,
            extra: vec![1],
        };
        let h2 = Header {
            extra: vec![2],
            ..h1.clone()
        };
        let report = encode_report(&h1, &h2);

        let tx = call_tx(0, CallFunc::ReportIllegal, report.clone());
        pool.add_transaction_at(&state, &head(10, 1_000), from, tx, 1_000)
            .expect("admitted");

        let dup = call_tx(5, CallFunc::ReportIllegal, report);
        assert!(matches!(
            pool.add_transaction_at(&state, &head(10, 1_000), other, dup, 1_000),
            Err(BlockchainError::ReportInPool)
        ));
    }

    #[test]
    fn test_receive_asset_payable_needs_contract() {
        let pool = Mempool::new();
        let mut state = StateDB::new();
        let from = Address::repeat_byte(0x0a);
        let contract = Address::repeat_byte(0x0b);
        state.add_balance(&from, &SYSTEM_ASSET_ID, coin() * 100);

        let now = 1_000u64;
        let mut data = Vec::new();
        data.extend_from_slice(&RECEIVE_ASSET_SELECTOR);
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&now.to_be_bytes());
        data.extend_from_slice(&word); // start
        data.extend_from_slice(&[0u8; 32]); // end = forever
        data.extend_from_slice(&[0u8; 32]); // flag = use any

        let fork2 = tempo_common::config::hard_fork_height(2).expect("configured");
        let tx = Transaction {
            nonce: 0,
            gas_price: U256::one(),
            gas_limit: 21_000,
            to: Some(contract),
            value: coin(),
            data,
        };

        // the receiver carries no code yet
        let err = pool
            .validate_transaction_at(&state, &head(fork2, now), &from, &tx, now)
            .unwrap_err();
        assert!(matches!(err, BlockchainError::ReceiverMustBeContract));

        state.set_data(&contract, vec![0x60, 0x60]);
        pool.validate_transaction_at(&state, &head(fork2, now), &from, &tx, now)
            .expect("affordable");
    }
}
