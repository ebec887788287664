//! Typed call payloads.
//!
//! Every state-changing operation of the asset core travels as a
//! `CallParam` envelope: a stable one-byte function tag plus the RLP
//! encoding of the per-function parameter struct. The tag values are
//! fixed by chain history and must never change.

mod asset;
mod swap;
mod timelock;

pub use asset::{AssetValueChangeParam, GenAssetParam, SendAssetParam};
pub use swap::{
    MakeMultiSwapParam, MakeSwapParam, RecallMultiSwapParam, RecallSwapParam, TakeMultiSwapParam,
    TakeSwapParam,
};
pub use timelock::{BuyTicketParam, LockType, TimeLockParam};

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_ASSET_NAME_LEN: usize = 128;
pub const MAX_ASSET_SYMBOL_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_TRANSAC_DATA_LEN: usize = 256;
pub const MAX_SWAP_TARGETS: usize = 64;
pub const MAX_SWAP_LEGS: usize = 8;

/// Structural parameter failures reported by `check` methods.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name or symbol is too long")]
    NameTooLong,

    #[error("description is too long")]
    DescriptionTooLong,

    #[error("value must be positive")]
    ZeroValue,

    #[error("asset id must not be zero")]
    ZeroAssetId,

    #[error("receiver address must be set and not zero address")]
    ZeroAddress,

    #[error("start time {start} is after end time {end}")]
    InvalidTimeRange { start: u64, end: u64 },

    #[error("operation is already expired")]
    AlreadyExpired,

    #[error("start time is too far in the future")]
    StartTooLate,

    #[error("amount overflow")]
    Overflow,

    #[error("swap has no legs")]
    NoLegs,

    #[error("swap leg arrays have mismatched lengths")]
    MismatchedLegs,

    #[error("too many swap legs")]
    TooManyLegs,

    #[error("too many swap targets")]
    TooManyTargets,

    #[error("size must be positive and within swap size")]
    SizeOutOfRange,

    #[error("unknown lock type")]
    UnknownLockType,
}

/// Stable function tags of the typed call dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CallFunc {
    GenNotation = 1,
    GenAsset = 2,
    SendAsset = 3,
    TimeLock = 4,
    BuyTicket = 5,
    AssetValueChange = 6,
    Empty = 7,
    MakeSwap = 8,
    RecallSwap = 9,
    TakeSwap = 10,
    RecallMultiSwap = 11,
    MakeMultiSwap = 12,
    TakeMultiSwap = 13,
    ReportIllegal = 14,
    MakeSwapExt = 15,
    TakeSwapExt = 16,
}

impl CallFunc {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(CallFunc::GenNotation),
            2 => Some(CallFunc::GenAsset),
            3 => Some(CallFunc::SendAsset),
            4 => Some(CallFunc::TimeLock),
            5 => Some(CallFunc::BuyTicket),
            6 => Some(CallFunc::AssetValueChange),
            7 => Some(CallFunc::Empty),
            8 => Some(CallFunc::MakeSwap),
            9 => Some(CallFunc::RecallSwap),
            10 => Some(CallFunc::TakeSwap),
            11 => Some(CallFunc::RecallMultiSwap),
            12 => Some(CallFunc::MakeMultiSwap),
            13 => Some(CallFunc::TakeMultiSwap),
            14 => Some(CallFunc::ReportIllegal),
            15 => Some(CallFunc::MakeSwapExt),
            16 => Some(CallFunc::TakeSwapExt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CallFunc::GenNotation => "GenNotation",
            CallFunc::GenAsset => "GenAsset",
            CallFunc::SendAsset => "SendAsset",
            CallFunc::TimeLock => "TimeLock",
            CallFunc::BuyTicket => "BuyTicket",
            CallFunc::AssetValueChange => "AssetValueChange",
            CallFunc::Empty => "Empty",
            CallFunc::MakeSwap => "MakeSwap",
            CallFunc::RecallSwap => "RecallSwap",
            CallFunc::TakeSwap => "TakeSwap",
            CallFunc::RecallMultiSwap => "RecallMultiSwap",
            CallFunc::MakeMultiSwap => "MakeMultiSwap",
            CallFunc::TakeMultiSwap => "TakeMultiSwap",
            CallFunc::ReportIllegal => "ReportIllegal",
            CallFunc::MakeSwapExt => "MakeSwapExt",
            CallFunc::TakeSwapExt => "TakeSwapExt",
        }
    }
}

/// The call envelope: tag plus the RLP encoding of the per-function
/// parameter struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParam {
    pub func: CallFunc,
    pub data: Vec<u8>,
}

impl Serialize for CallParam {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("CallParam", 2)?;
        s.serialize_field("func", self.func.name())?;
        s.serialize_field("data", &hex::encode(&self.data))?;
        s.end()
    }
}

impl Encodable for CallParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&(self.func as u8));
        s.append(&self.data);
    }
}

impl Decodable for CallParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let tag: u8 = rlp.val_at(0)?;
        let func = CallFunc::from_u8(tag).ok_or(DecoderError::Custom("unknown call func tag"))?;
        Ok(Self {
            func,
            data: rlp.val_at(1)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values_are_stable() {
        // fixed by chain history
        assert_eq!(CallFunc::GenNotation as u8, 1);
        assert_eq!(CallFunc::GenAsset as u8, 2);
        assert_eq!(CallFunc::SendAsset as u8, 3);
        assert_eq!(CallFunc::TimeLock as u8, 4);
        assert_eq!(CallFunc::BuyTicket as u8, 5);
        assert_eq!(CallFunc::AssetValueChange as u8, 6);
        assert_eq!(CallFunc::Empty as u8, 7);
        assert_eq!(CallFunc::MakeSwap as u8, 8);
        assert_eq!(CallFunc::RecallSwap as u8, 9);
        assert_eq!(CallFunc::TakeSwap as u8, 10);
        assert_eq!(CallFunc::RecallMultiSwap as u8, 11);
        assert_eq!(CallFunc::MakeMultiSwap as u8, 12);
        assert_eq!(CallFunc::TakeMultiSwap as u8, 13);
        assert_eq!(CallFunc::ReportIllegal as u8, 14);
        assert_eq!(CallFunc::MakeSwapExt as u8, 15);
        assert_eq!(CallFunc::TakeSwapExt as u8, 16);
    }

    #[test]
    fn test_from_u8_total() {
        for tag in 1..=16u8 {
            let func = CallFunc::from_u8(tag).expect("known tag");
            assert_eq!(func as u8, tag);
        }
        assert_eq!(CallFunc::from_u8(0), None);
        assert_eq!(CallFunc::from_u8(17), None);
    }

    #[test]
    fn test_envelope_roundtrip() {
        let param = CallParam {
            func: CallFunc::SendAsset,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let decoded: CallParam = rlp::decode(&rlp::encode(&param)).expect("decodes");
        assert_eq!(param, decoded);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut s = rlp::RlpStream::new_list(2);
        s.append(&200u8);
        s.append(&vec![0u8; 2]);
        let out = s.out();
        assert!(rlp::decode::<CallParam>(&out).is_err());
    }
}
