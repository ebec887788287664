use super::{ParamError, MAX_DESCRIPTION_LEN, MAX_SWAP_LEGS, MAX_SWAP_TARGETS};
use crate::crypto::{Address, Hash};
use crate::swap::{MultiSwap, Swap};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// Parameters of a single-asset swap offer. The swap id derives from
/// the creating transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeSwapParam {
    pub from_asset_id: Hash,
    pub from_start_time: u64,
    pub from_end_time: u64,
    pub min_from_amount: U256,
    pub to_asset_id: Hash,
    pub to_start_time: u64,
    pub to_end_time: u64,
    pub min_to_amount: U256,
    pub swap_size: U256,
    pub targets: Vec<Address>,
    pub time: u64,
    pub description: String,
}

impl MakeSwapParam {
    pub fn check(&self, _height: u64, timestamp: u64) -> Result<(), ParamError> {
        if self.min_from_amount.is_zero() || self.min_to_amount.is_zero() {
            return Err(ParamError::ZeroValue);
        }
        if self.swap_size.is_zero() {
            return Err(ParamError::ZeroValue);
        }
        check_leg(self.from_start_time, self.from_end_time, timestamp)?;
        check_leg(self.to_start_time, self.to_end_time, timestamp)?;
        if self.targets.len() > MAX_SWAP_TARGETS {
            return Err(ParamError::TooManyTargets);
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(ParamError::DescriptionTooLong);
        }
        // escrow totals must stay representable
        self.min_from_amount
            .checked_mul(self.swap_size)
            .ok_or(ParamError::Overflow)?;
        self.min_to_amount
            .checked_mul(self.swap_size)
            .ok_or(ParamError::Overflow)?;
        Ok(())
    }
}

impl Encodable for MakeSwapParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(12);
        s.append(&self.from_asset_id);
        s.append(&self.from_start_time);
        s.append(&self.from_end_time);
        s.append(&self.min_from_amount);
        s.append(&self.to_asset_id);
        s.append(&self.to_start_time);
        s.append(&self.to_end_time);
        s.append(&self.min_to_amount);
        s.append(&self.swap_size);
        s.append_list(&self.targets);
        s.append(&self.time);
        s.append(&self.description);
    }
}

impl Decodable for MakeSwapParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            from_asset_id: rlp.val_at(0)?,
            from_start_time: rlp.val_at(1)?,
            from_end_time: rlp.val_at(2)?,
            min_from_amount: rlp.val_at(3)?,
            to_asset_id: rlp.val_at(4)?,
            to_start_time: rlp.val_at(5)?,
            to_end_time: rlp.val_at(6)?,
            min_to_amount: rlp.val_at(7)?,
            swap_size: rlp.val_at(8)?,
            targets: rlp.list_at(9)?,
            time: rlp.val_at(10)?,
            description: rlp.val_at(11)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallSwapParam {
    pub swap_id: Hash,
}

impl Encodable for RecallSwapParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(1);
        s.append(&self.swap_id);
    }
}

impl Decodable for RecallSwapParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            swap_id: rlp.val_at(0)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeSwapParam {
    pub swap_id: Hash,
    pub size: U256,
}

impl TakeSwapParam {
    pub fn check(&self, _height: u64, swap: &Swap, timestamp: u64) -> Result<(), ParamError> {
        if self.size.is_zero() || self.size > swap.swap_size {
            return Err(ParamError::SizeOutOfRange);
        }
        if swap.from_end_time <= timestamp || swap.to_end_time <= timestamp {
            return Err(ParamError::AlreadyExpired);
        }
        swap.min_from_amount
            .checked_mul(self.size)
            .ok_or(ParamError::Overflow)?;
        swap.min_to_amount
            .checked_mul(self.size)
            .ok_or(ParamError::Overflow)?;
        Ok(())
    }
}

impl Encodable for TakeSwapParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.swap_id);
        s.append(&self.size);
    }
}

impl Decodable for TakeSwapParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            swap_id: rlp.val_at(0)?,
            size: rlp.val_at(1)?,
        })
    }
}

/// Parameters of a multi-asset swap offer: parallel arrays per leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeMultiSwapParam {
    pub from_asset_ids: Vec<Hash>,
    pub from_start_times: Vec<u64>,
    pub from_end_times: Vec<u64>,
    pub min_from_amounts: Vec<U256>,
    pub to_asset_ids: Vec<Hash>,
    pub to_start_times: Vec<u64>,
    pub to_end_times: Vec<u64>,
    pub min_to_amounts: Vec<U256>,
    pub swap_size: U256,
    pub targets: Vec<Address>,
    pub time: u64,
    pub description: String,
}

impl MakeMultiSwapParam {
    pub fn check(&self, _height: u64, timestamp: u64) -> Result<(), ParamError> {
        let ln_from = self.from_asset_ids.len();
        let ln_to = self.to_asset_ids.len();
        if ln_from == 0 || ln_to == 0 {
            return Err(ParamError::NoLegs);
        }
        if ln_from > MAX_SWAP_LEGS || ln_to > MAX_SWAP_LEGS {
            return Err(ParamError::TooManyLegs);
        }
        if self.from_start_times.len() != ln_from
            || self.from_end_times.len() != ln_from
            || self.min_from_amounts.len() != ln_from
            || self.to_start_times.len() != ln_to
            || self.to_end_times.len() != ln_to
            || self.min_to_amounts.len() != ln_to
        {
            return Err(ParamError::MismatchedLegs);
        }
        if self.swap_size.is_zero() {
            return Err(ParamError::ZeroValue);
        }
        for i in 0..ln_from {
            if self.min_from_amounts[i].is_zero() {
                return Err(ParamError::ZeroValue);
            }
            check_leg(self.from_start_times[i], self.from_end_times[i], timestamp)?;
            self.min_from_amounts[i]
                .checked_mul(self.swap_size)
                .ok_or(ParamError::Overflow)?;
        }
        for i in 0..ln_to {
            if self.min_to_amounts[i].is_zero() {
                return Err(ParamError::ZeroValue);
            }
            check_leg(self.to_start_times[i], self.to_end_times[i], timestamp)?;
            self.min_to_amounts[i]
                .checked_mul(self.swap_size)
                .ok_or(ParamError::Overflow)?;
        }
        if self.targets.len() > MAX_SWAP_TARGETS {
            return Err(ParamError::TooManyTargets);
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(ParamError::DescriptionTooLong);
        }
        Ok(())
    }
}

impl Encodable for MakeMultiSwapParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(12);
        s.append_list(&self.from_asset_ids);
        s.append_list(&self.from_start_times);
        s.append_list(&self.from_end_times);
        s.append_list(&self.min_from_amounts);
        s.append_list(&self.to_asset_ids);
        s.append_list(&self.to_start_times);
        s.append_list(&self.to_end_times);
        s.append_list(&self.min_to_amounts);
        s.append(&self.swap_size);
        s.append_list(&self.targets);
        s.append(&self.time);
        s.append(&self.description);
    }
}

impl Decodable for MakeMultiSwapParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            from_asset_ids: rlp.list_at(0)?,
            from_start_times: rlp.list_at(1)?,
            from_end_times: rlp.list_at(2)?,
            min_from_amounts: rlp.list_at(3)?,
            to_asset_ids: rlp.list_at(4)?,
            to_start_times: rlp.list_at(5)?,
            to_end_times: rlp.list_at(6)?,
            min_to_amounts: rlp.list_at(7)?,
            swap_size: rlp.val_at(8)?,
            targets: rlp.list_at(9)?,
            time: rlp.val_at(10)?,
            description: rlp.val_at(11)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallMultiSwapParam {
    pub swap_id: Hash,
}

impl Encodable for RecallMultiSwapParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(1);
        s.append(&self.swap_id);
    }
}

impl Decodable for RecallMultiSwapParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            swap_id: rlp.val_at(0)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeMultiSwapParam {
    pub swap_id: Hash,
    pub size: U256,
}

impl TakeMultiSwapParam {
    pub fn check(&self, _height: u64, swap: &MultiSwap, timestamp: u64) -> Result<(), ParamError> {
        if self.size.is_zero() || self.size > swap.swap_size {
            return Err(ParamError::SizeOutOfRange);
        }
        for end in swap.from_end_times.iter().chain(swap.to_end_times.iter()) {
            if *end <= timestamp {
                return Err(ParamError::AlreadyExpired);
            }
        }
        for amount in swap
            .min_from_amounts
            .iter()
            .chain(swap.min_to_amounts.iter())
        {
            amount.checked_mul(self.size).ok_or(ParamError::Overflow)?;
        }
        Ok(())
    }
}

impl Encodable for TakeMultiSwapParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.swap_id);
        s.append(&self.size);
    }
}

impl Decodable for TakeMultiSwapParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            swap_id: rlp.val_at(0)?,
            size: rlp.val_at(1)?,
        })
    }
}

fn check_leg(start: u64, end: u64, timestamp: u64) -> Result<(), ParamError> {
    if start > end {
        return Err(ParamError::InvalidTimeRange { start, end });
    }
    if end <= timestamp {
        return Err(ParamError::AlreadyExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timelock::{TIMELOCK_FOREVER, TIMELOCK_NOW};

    fn sample_make() -> MakeSwapParam {
        MakeSwapParam {
            from_asset_id: Hash::repeat_byte(0x01),
            from_start_time: TIMELOCK_NOW,
            from_end_time: TIMELOCK_FOREVER,
            min_from_amount: U256::from(10u64),
            to_asset_id: Hash::repeat_byte(0x02),
            to_start_time: TIMELOCK_NOW,
            to_end_time: TIMELOCK_FOREVER,
            min_to_amount: U256::from(20u64),
            swap_size: U256::from(5u64),
            targets: vec![],
            time: 1_000,
            description: String::new(),
        }
    }

    #[test]
    fn test_make_swap_check() {
        let param = sample_make();
        assert!(param.check(1, 500).is_ok());

        let mut zero_size = param.clone();
        zero_size.swap_size = U256::zero();
        assert_eq!(zero_size.check(1, 500), Err(ParamError::ZeroValue));

        let mut expired = param.clone();
        expired.to_end_time = 400;
        assert_eq!(expired.check(1, 500), Err(ParamError::AlreadyExpired));

        let mut overflow = param;
        overflow.min_from_amount = U256::MAX;
        overflow.swap_size = U256::from(2u64);
        assert_eq!(overflow.check(1, 500), Err(ParamError::Overflow));
    }

    #[test]
    fn test_make_swap_rlp_roundtrip() {
        let mut param = sample_make();
        param.targets = vec![Address::repeat_byte(0x0a), Address::repeat_byte(0x0b)];
        param.description = "trade".into();
        let decoded: MakeSwapParam = rlp::decode(&rlp::encode(&param)).expect("decodes");
        assert_eq!(param, decoded);
    }

    #[test]
    fn test_multi_swap_leg_validation() {
        let param = MakeMultiSwapParam {
            from_asset_ids: vec![Hash::repeat_byte(0x01), Hash::repeat_byte(0x02)],
            from_start_times: vec![TIMELOCK_NOW],
            from_end_times: vec![TIMELOCK_FOREVER, TIMELOCK_FOREVER],
            min_from_amounts: vec![U256::one(), U256::one()],
            to_asset_ids: vec![Hash::repeat_byte(0x03)],
            to_start_times: vec![TIMELOCK_NOW],
            to_end_times: vec![TIMELOCK_FOREVER],
            min_to_amounts: vec![U256::one()],
            swap_size: U256::one(),
            targets: vec![],
            time: 0,
            description: String::new(),
        };
        assert_eq!(param.check(1, 500), Err(ParamError::MismatchedLegs));
    }

    #[test]
    fn test_take_swap_size_bounds() {
        let make = sample_make();
        let swap = Swap {
            id: Hash::repeat_byte(0xaa),
            owner: Address::repeat_byte(0x01),
            from_asset_id: make.from_asset_id,
            from_start_time: make.from_start_time,
            from_end_time: make.from_end_time,
            min_from_amount: make.min_from_amount,
            to_asset_id: make.to_asset_id,
            to_start_time: make.to_start_time,
            to_end_time: make.to_end_time,
            min_to_amount: make.min_to_amount,
            swap_size: make.swap_size,
            targets: vec![],
            time: make.time,
            description: String::new(),
            notation: 0,
        };
        let take = TakeSwapParam {
            swap_id: swap.id,
            size: U256::from(6u64),
        };
        assert_eq!(take.check(1, &swap, 500), Err(ParamError::SizeOutOfRange));

        let take = TakeSwapParam {
            swap_id: swap.id,
            size: U256::from(5u64),
        };
        assert!(take.check(1, &swap, 500).is_ok());
    }
}
