pub mod payload;

use crate::config::CALL_ADDRESS;
use crate::crypto::{keccak256, Address, Hash};
use self::payload::{CallFunc, CallParam};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// Canonical unsigned transaction view. Asset and swap ids are bound
/// to the hash of this view, so two different transactions can never
/// mint the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
}

impl Transaction {
    pub fn hash(&self) -> Hash {
        keccak256(&rlp::encode(self))
    }

    /// Combined gas budget in native atomic units.
    pub fn gas_value(&self) -> U256 {
        U256::from(self.gas_limit).saturating_mul(self.gas_price)
    }

    /// Whether this transaction targets the typed-call address.
    pub fn is_native_call(&self) -> bool {
        self.to == Some(CALL_ADDRESS)
    }

    /// Decode the typed-call envelope carried in the payload, if any.
    pub fn call_param(&self) -> Option<CallParam> {
        if !self.is_native_call() {
            return None;
        }
        rlp::decode(&self.data).ok()
    }

    pub fn is_buy_ticket(&self) -> bool {
        matches!(
            self.call_param(),
            Some(CallParam {
                func: CallFunc::BuyTicket,
                ..
            })
        )
    }
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        match &self.to {
            Some(addr) => s.append(addr),
            None => s.append_empty_data(),
        };
        s.append(&self.value);
        s.append(&self.data);
    }
}

impl Decodable for Transaction {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let to_rlp = rlp.at(3)?;
        let to = if to_rlp.is_empty() {
            None
        } else {
            Some(Address::decode(&to_rlp)?)
        };
        Ok(Self {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            to,
            value: rlp.val_at(4)?,
            data: rlp.val_at(5)?,
        })
    }
}

/// Which funding source a bridge-driven time-locked transfer may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SendAssetFlag {
    /// Prefer the time-lock balance, fall back to the plain balance.
    UseAny = 0,
    /// Spend the time-lock balance only.
    UseTimeLock = 1,
    /// Spend the plain balance only.
    UseAsset = 2,
}

impl SendAssetFlag {
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(SendAssetFlag::UseAny),
            1 => Some(SendAssetFlag::UseTimeLock),
            2 => Some(SendAssetFlag::UseAsset),
            _ => None,
        }
    }
}

/// Parameters of a time-locked transfer driven from outside the typed
/// call dispatcher (the contract bridge and the payable-receive path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTimeLockParam {
    pub asset_id: Hash,
    pub start_time: u64,
    pub end_time: u64,
    pub timestamp: u64,
    pub flag: SendAssetFlag,
    pub value: U256,
    /// Gas budget that must stay affordable next to the transfer when
    /// paying in the native asset; zero outside pool checks.
    pub gas_value: U256,
    pub block_number: u64,
    pub is_receive: bool,
}
