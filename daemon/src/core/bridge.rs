//! The native precompiled contract: exposes time-locked asset
//! transfers to EVM-called contracts at a fixed address. The input is
//! seven 32-byte big-endian words; only the sendAsset function is
//! implemented. Only contracts may call in, and the calling contract
//! is the logical sender.
//!
//! The transfer helpers at the bottom are shared with the mempool's
//! payable-receive pre-check.

use crate::core::error::BlockchainError;
use crate::core::state::StateDB;
use primitive_types::U256;
use tempo_common::config::{
    is_hard_fork, NATIVE_CONTRACT_ADDRESS, NATIVE_CONTRACT_GAS, SYSTEM_ASSET_ID,
};
use tempo_common::crypto::{Address, Hash};
use tempo_common::timelock::{
    is_whole_lifetime, new_time_lock, surplus_time_lock, TIMELOCK_FOREVER,
};
use tempo_common::transaction::{SendAssetFlag, TransferTimeLockParam};

const WORD: usize = 32;
const SEND_ASSET_INPUT_LEN: usize = 7 * WORD;

/// Function tags of the bridge input's first word.
const FC_SEND_ASSET: u64 = 1;

/// Whether the address resolves to the native contract at this height.
pub fn resolve_native_contract(addr: &Address, height: u64) -> bool {
    is_hard_fork(2, height) && *addr == NATIVE_CONTRACT_ADDRESS
}

/// One invocation of the native contract. `caller` is the contract
/// that called in; direct calls from externally owned accounts are
/// rejected.
pub struct NativeContract<'a> {
    pub state: &'a mut StateDB,
    pub caller: Address,
    pub caller_is_contract: bool,
    /// The executing block's own time (not the parent time).
    pub timestamp: u64,
    pub block_number: u64,
}

impl<'a> NativeContract<'a> {
    pub fn required_gas(&self, _input: &[u8]) -> u64 {
        NATIVE_CONTRACT_GAS
    }

    pub fn run(&mut self, input: &[u8]) -> Result<Vec<u8>, BlockchainError> {
        if input.len() < WORD {
            return Err(BlockchainError::UnknownBridgeFunc);
        }
        match read_word_u64(input, 0) {
            Some(FC_SEND_ASSET) => self.send_asset(input),
            _ => Err(BlockchainError::UnknownBridgeFunc),
        }
    }

    fn send_asset(&mut self, input: &[u8]) -> Result<Vec<u8>, BlockchainError> {
        if !self.caller_is_contract {
            return Err(BlockchainError::MustCallByContract);
        }
        let p = self.parse_send_asset_params(input)?;
        let from = self.caller;
        let to = Address::from_slice_padded(&input[2 * WORD..3 * WORD]);

        if !can_transfer_timelock(self.state, &from, &p) {
            return Err(BlockchainError::InsufficientBalance);
        }
        transfer_timelock(self.state, &from, &to, &p)?;
        Ok(b"Ok: sendAsset".to_vec())
    }

    fn parse_send_asset_params(
        &self,
        input: &[u8],
    ) -> Result<TransferTimeLockParam, BlockchainError> {
        if input.len() != SEND_ASSET_INPUT_LEN {
            return Err(BlockchainError::WrongInputLength);
        }
        let asset_id = Hash::from_slice_padded(&input[WORD..2 * WORD]);
        let value = U256::from_big_endian(&input[3 * WORD..4 * WORD]);
        let mut start = read_word_u64(input, 4).ok_or(BlockchainError::ValueOverflow)?;
        let mut end = read_word_u64(input, 5).ok_or(BlockchainError::ValueOverflow)?;
        let flag_raw = read_word_u64(input, 6).ok_or(BlockchainError::InvalidSendAssetFlag)?;
        let flag =
            SendAssetFlag::from_u64(flag_raw).ok_or(BlockchainError::InvalidSendAssetFlag)?;

        // adjust the window to the executing block
        if start < self.timestamp {
            start = self.timestamp;
        }
        if end == 0 {
            end = TIMELOCK_FOREVER;
        }
        if start > end {
            return Err(BlockchainError::WrongTimeRange);
        }

        Ok(TransferTimeLockParam {
            asset_id,
            start_time: start,
            end_time: end,
            timestamp: self.timestamp,
            flag,
            value,
            gas_value: U256::zero(),
            block_number: self.block_number,
            is_receive: false,
        })
    }
}

/// Read-only feasibility check for a flag-controlled time-locked
/// transfer, including the gas the sender must still afford.
pub fn can_transfer_timelock(state: &StateDB, addr: &Address, p: &TransferTimeLockParam) -> bool {
    let start = p.start_time.max(p.timestamp);
    let need = match new_time_lock(p.value, start, p.end_time) {
        Ok(need) => need,
        Err(_) => return false,
    };

    let system_balance = state.get_balance(&SYSTEM_ASSET_ID, addr);
    let timelock_ok = state.get_timelock_balance(&p.asset_id, addr).covers(&need)
        && system_balance >= p.gas_value;

    let asset_balance = state.get_balance(&p.asset_id, addr);
    let balance_ok = if p.asset_id == SYSTEM_ASSET_ID {
        asset_balance >= p.value.saturating_add(p.gas_value)
    } else {
        asset_balance >= p.value && system_balance >= p.gas_value
    };

    match p.flag {
        SendAssetFlag::UseAny => timelock_ok || balance_ok,
        SendAssetFlag::UseTimeLock => timelock_ok,
        SendAssetFlag::UseAsset => balance_ok,
    }
}

/// Perform the transfer. Prefers the time-lock balance when the flag
/// allows it; a balance-funded transfer refunds the conversion surplus
/// to the sender. A whole-lifetime window credits the recipient's
/// plain balance.
pub fn transfer_timelock(
    state: &mut StateDB,
    from: &Address,
    to: &Address,
    p: &TransferTimeLockParam,
) -> Result<(), BlockchainError> {
    let timestamp = p.timestamp;
    let start = p.start_time.max(timestamp);
    let end = p.end_time;
    let need = new_time_lock(p.value, start, end)?;

    let pay_from_timelock = match p.flag {
        SendAssetFlag::UseTimeLock => true,
        SendAssetFlag::UseAsset => false,
        SendAssetFlag::UseAny => state.get_timelock_balance(&p.asset_id, from).covers(&need),
    };

    if pay_from_timelock {
        state.sub_timelock_balance(from, &p.asset_id, &need, p.block_number, timestamp)?;
    } else {
        state.sub_balance(from, &p.asset_id, p.value)?;
        let surplus = surplus_time_lock(p.value, p.start_time, end, timestamp);
        if !surplus.is_empty() {
            state.add_timelock_balance(from, &p.asset_id, &surplus, p.block_number, timestamp);
        }
    }

    if is_whole_lifetime(start, end, timestamp) {
        state.add_balance(to, &p.asset_id, p.value);
    } else {
        state.add_timelock_balance(to, &p.asset_id, &need, p.block_number, timestamp);
    }
    Ok(())
}

fn read_word_u64(input: &[u8], word_index: usize) -> Option<u64> {
    let start = word_index * WORD;
    let word = &input[start..start + WORD];
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }
    Some(u64::from_be_bytes([
        word[24], word[25], word[26], word[27], word[28], word[29], word[30], word[31],
    ]))
}
