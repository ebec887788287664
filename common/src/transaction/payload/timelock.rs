use super::ParamError;
use crate::config::TICKET_START_WINDOW;
use crate::crypto::{Address, Hash};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// Direction of a TimeLock call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LockType {
    /// Convert plain balance into a time lock on the recipient.
    AssetToTimeLock = 0,
    /// Move an existing time lock between accounts.
    TimeLockToTimeLock = 1,
    /// Release a time lock back into plain balance.
    TimeLockToAsset = 2,
    /// Fork-gated transfer that picks whichever source suffices.
    SmartTransfer = 3,
}

impl LockType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LockType::AssetToTimeLock),
            1 => Some(LockType::TimeLockToTimeLock),
            2 => Some(LockType::TimeLockToAsset),
            3 => Some(LockType::SmartTransfer),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LockType::AssetToTimeLock => "AssetToTimeLock",
            LockType::TimeLockToTimeLock => "TimeLockToTimeLock",
            LockType::TimeLockToAsset => "TimeLockToAsset",
            LockType::SmartTransfer => "SmartTransfer",
        }
    }
}

/// Parameters of the TimeLock call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockParam {
    pub lock_type: LockType,
    pub asset_id: Hash,
    pub to: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub value: U256,
}

impl TimeLockParam {
    pub fn check(&self, _height: u64, timestamp: u64) -> Result<(), ParamError> {
        if self.asset_id.is_zero() {
            return Err(ParamError::ZeroAssetId);
        }
        if self.value.is_zero() {
            return Err(ParamError::ZeroValue);
        }
        if self.start_time > self.end_time {
            return Err(ParamError::InvalidTimeRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.end_time <= timestamp {
            return Err(ParamError::AlreadyExpired);
        }
        Ok(())
    }
}

impl Encodable for TimeLockParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        s.append(&(self.lock_type as u8));
        s.append(&self.asset_id);
        s.append(&self.to);
        s.append(&self.start_time);
        s.append(&self.end_time);
        s.append(&self.value);
    }
}

impl Decodable for TimeLockParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let raw: u8 = rlp.val_at(0)?;
        let lock_type =
            LockType::from_u8(raw).ok_or(DecoderError::Custom("unknown lock type"))?;
        Ok(Self {
            lock_type,
            asset_id: rlp.val_at(1)?,
            to: rlp.val_at(2)?,
            start_time: rlp.val_at(3)?,
            end_time: rlp.val_at(4)?,
            value: rlp.val_at(5)?,
        })
    }
}

/// Parameters of a ticket purchase. The price is not part of the
/// payload; it is fixed by the block height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyTicketParam {
    pub start: u64,
    pub end: u64,
}

impl BuyTicketParam {
    /// A zero `timestamp` skips the timestamp-relative window checks
    /// (pre-fork behavior).
    pub fn check(&self, _height: u64, timestamp: u64) -> Result<(), ParamError> {
        if self.start >= self.end {
            return Err(ParamError::InvalidTimeRange {
                start: self.start,
                end: self.end,
            });
        }
        if timestamp != 0 {
            if self.start > timestamp + TICKET_START_WINDOW {
                return Err(ParamError::StartTooLate);
            }
            if self.end <= timestamp {
                return Err(ParamError::AlreadyExpired);
            }
        }
        Ok(())
    }
}

impl Encodable for BuyTicketParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.start);
        s.append(&self.end);
    }
}

impl Decodable for BuyTicketParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            start: rlp.val_at(0)?,
            end: rlp.val_at(1)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TimeLockParam {
        TimeLockParam {
            lock_type: LockType::AssetToTimeLock,
            asset_id: Hash::repeat_byte(0xff),
            to: Address::repeat_byte(0x02),
            start_time: 1_000,
            end_time: 2_000,
            value: U256::from(40u64),
        }
    }

    #[test]
    fn test_time_lock_check() {
        let param = sample();
        assert!(param.check(1, 500).is_ok());
        assert_eq!(param.check(1, 2_000), Err(ParamError::AlreadyExpired));

        let mut inverted = param.clone();
        inverted.start_time = 3_000;
        assert_eq!(
            inverted.check(1, 500),
            Err(ParamError::InvalidTimeRange {
                start: 3_000,
                end: 2_000
            })
        );
    }

    #[test]
    fn test_time_lock_rlp_roundtrip() {
        let param = sample();
        let decoded: TimeLockParam = rlp::decode(&rlp::encode(&param)).expect("decodes");
        assert_eq!(param, decoded);
    }

    #[test]
    fn test_buy_ticket_check() {
        let param = BuyTicketParam {
            start: 2_000,
            end: 5_000,
        };
        // zero timestamp skips the window checks
        assert!(param.check(1, 0).is_ok());
        assert!(param.check(1, 1_900).is_ok());
        // start too far past the reference time
        assert_eq!(param.check(1, 100), Err(ParamError::StartTooLate));
        // already over
        assert_eq!(param.check(1, 5_000), Err(ParamError::AlreadyExpired));

        let inverted = BuyTicketParam {
            start: 10,
            end: 10,
        };
        assert!(inverted.check(1, 0).is_err());
    }
}
