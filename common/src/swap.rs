use crate::crypto::{Address, Hash};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("address is not a target of this swap")]
pub struct NotSwapTarget;

/// A private swap restricts takers to its target list; an empty list
/// means anyone may take.
pub fn check_swap_targets(targets: &[Address], addr: &Address) -> Result<(), NotSwapTarget> {
    if targets.is_empty() || targets.contains(addr) {
        Ok(())
    } else {
        Err(NotSwapTarget)
    }
}

/// An open offer to exchange `min_from_amount` units per lot of the
/// from-asset against `min_to_amount` units of the to-asset, fillable
/// lot by lot up to `swap_size`. Time bounds on either leg turn that
/// leg into a time-locked transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub id: Hash,
    pub owner: Address,
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
    pub notation: u64,
}

impl Encodable for Swap {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(15);
        s.append(&self.id);
        s.append(&self.owner);
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
        s.append(&self.notation);
    }
}

impl Decodable for Swap {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            id: rlp.val_at(0)?,
            owner: rlp.val_at(1)?,
            from_asset_id: rlp.val_at(2)?,
            from_start_time: rlp.val_at(3)?,
            from_end_time: rlp.val_at(4)?,
            min_from_amount: rlp.val_at(5)?,
            to_asset_id: rlp.val_at(6)?,
            to_start_time: rlp.val_at(7)?,
            to_end_time: rlp.val_at(8)?,
            min_to_amount: rlp.val_at(9)?,
            swap_size: rlp.val_at(10)?,
            targets: rlp.list_at(11)?,
            time: rlp.val_at(12)?,
            description: rlp.val_at(13)?,
            notation: rlp.val_at(14)?,
        })
    }
}

/// Multi-asset variant of [`Swap`] with parallel arrays per leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSwap {
    pub id: Hash,
    pub owner: Address,
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
    pub notation: u64,
}

impl Encodable for MultiSwap {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(15);
        s.append(&self.id);
        s.append(&self.owner);
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
        s.append(&self.notation);
    }
}

impl Decodable for MultiSwap {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            id: rlp.val_at(0)?,
            owner: rlp.val_at(1)?,
            from_asset_ids: rlp.list_at(2)?,
            from_start_times: rlp.list_at(3)?,
            from_end_times: rlp.list_at(4)?,
            min_from_amounts: rlp.list_at(5)?,
            to_asset_ids: rlp.list_at(6)?,
            to_start_times: rlp.list_at(7)?,
            to_end_times: rlp.list_at(8)?,
            min_to_amounts: rlp.list_at(9)?,
            swap_size: rlp.val_at(10)?,
            targets: rlp.list_at(11)?,
            time: rlp.val_at(12)?,
            description: rlp.val_at(13)?,
            notation: rlp.val_at(14)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_swap_targets() {
        let alice = Address::repeat_byte(0x01);
        let bob = Address::repeat_byte(0x02);
        assert!(check_swap_targets(&[], &alice).is_ok());
        assert!(check_swap_targets(&[alice], &alice).is_ok());
        assert_eq!(check_swap_targets(&[alice], &bob), Err(NotSwapTarget));
    }
}
