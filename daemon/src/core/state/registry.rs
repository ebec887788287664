//! Registry records persisted through the structured-storage codec:
//! the notation bijection, assets, swaps and double-mining reports.
//! Removal never deletes a record; it sets a tombstone flag so history
//! stays addressable.

use super::StateDB;
use crate::core::error::BlockchainError;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use tempo_common::asset::Asset;
use tempo_common::config::{
    ASSET_KEY_ADDRESS, MULTI_SWAP_KEY_ADDRESS, NOTATION_KEY_ADDRESS, REPORT_KEY_ADDRESS,
    SWAP_KEY_ADDRESS,
};
use tempo_common::crypto::{keccak256, Address, Hash};
use tempo_common::swap::{MultiSwap, Swap};

struct NotationRecord {
    deleted: bool,
    count: u64,
    address: Address,
}

impl Encodable for NotationRecord {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.deleted);
        s.append(&self.count);
        s.append(&self.address);
    }
}

impl Decodable for NotationRecord {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            deleted: rlp.val_at(0)?,
            count: rlp.val_at(1)?,
            address: rlp.val_at(2)?,
        })
    }
}

struct AssetRecord {
    deleted: bool,
    asset: Asset,
}

impl Encodable for AssetRecord {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.deleted);
        s.append(&self.asset);
    }
}

impl Decodable for AssetRecord {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            deleted: rlp.val_at(0)?,
            asset: rlp.val_at(1)?,
        })
    }
}

struct SwapRecord {
    deleted: bool,
    swap: Swap,
}

impl Encodable for SwapRecord {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.deleted);
        s.append(&self.swap);
    }
}

impl Decodable for SwapRecord {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            deleted: rlp.val_at(0)?,
            swap: rlp.val_at(1)?,
        })
    }
}

struct MultiSwapRecord {
    deleted: bool,
    swap: MultiSwap,
}

impl Encodable for MultiSwapRecord {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.deleted);
        s.append(&self.swap);
    }
}

impl Decodable for MultiSwapRecord {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            deleted: rlp.val_at(0)?,
            swap: rlp.val_at(1)?,
        })
    }
}

fn notation_key(notation: u64) -> [u8; 8] {
    notation.to_be_bytes()
}

impl StateDB {
    // ----- notation registry -----

    pub fn get_notation_count(&self) -> Result<u64, BlockchainError> {
        let data = self.get_struct_data(&NOTATION_KEY_ADDRESS, NOTATION_KEY_ADDRESS.as_bytes());
        if data.is_empty() {
            return Ok(0); // not created yet
        }
        let record: NotationRecord = rlp::decode(&data)
            .map_err(|e| BlockchainError::Corruption(format!("notation count: {e}")))?;
        Ok(record.count)
    }

    pub(crate) fn set_notation_count(&mut self, count: u64) {
        let record = NotationRecord {
            deleted: false,
            count,
            address: Address::zero(),
        };
        let data = rlp::encode(&record).to_vec();
        self.set_struct_data(&NOTATION_KEY_ADDRESS, &NOTATION_KEY_ADDRESS.to_bytes(), &data);
    }

    pub(crate) fn set_notation_lookup(&mut self, notation: u64, address: &Address) {
        let record = NotationRecord {
            deleted: false,
            count: notation,
            address: *address,
        };
        let data = rlp::encode(&record).to_vec();
        self.set_struct_data(&NOTATION_KEY_ADDRESS, &notation_key(notation), &data);
    }

    pub fn get_address_by_notation(&self, notation: u64) -> Result<Address, BlockchainError> {
        let data = self.get_struct_data(&NOTATION_KEY_ADDRESS, &notation_key(notation));
        if data.is_empty() {
            return Err(BlockchainError::NotationNotFound(notation));
        }
        let record: NotationRecord = rlp::decode(&data)
            .map_err(|e| BlockchainError::Corruption(format!("notation {notation}: {e}")))?;
        if record.deleted || record.address.is_zero() {
            return Err(BlockchainError::NotationNotFound(notation));
        }
        Ok(record.address)
    }

    // ----- asset registry -----

    pub fn get_asset(&self, asset_id: &Hash) -> Result<Asset, BlockchainError> {
        let data = self.get_struct_data(&ASSET_KEY_ADDRESS, asset_id.as_bytes());
        if data.is_empty() {
            return Err(BlockchainError::AssetNotFound(*asset_id));
        }
        let record: AssetRecord = rlp::decode(&data)
            .map_err(|e| BlockchainError::Corruption(format!("asset {asset_id}: {e}")))?;
        if record.deleted {
            return Err(BlockchainError::AssetNotFound(*asset_id));
        }
        Ok(record.asset)
    }

    /// Register a new asset; the id must be unused (tombstones count
    /// as used history but read as not found).
    pub fn gen_asset(&mut self, asset: Asset) -> Result<(), BlockchainError> {
        if self.get_asset(&asset.id).is_ok() {
            return Err(BlockchainError::AssetExists(asset.id));
        }
        self.put_asset(asset);
        Ok(())
    }

    /// Overwrite an existing asset record.
    pub fn update_asset(&mut self, asset: Asset) -> Result<(), BlockchainError> {
        self.put_asset(asset);
        Ok(())
    }

    fn put_asset(&mut self, asset: Asset) {
        let id = asset.id;
        let record = AssetRecord {
            deleted: false,
            asset,
        };
        let data = rlp::encode(&record).to_vec();
        self.set_struct_data(&ASSET_KEY_ADDRESS, id.as_bytes(), &data);
    }

    // ----- swap registry -----

    pub fn get_swap(&self, swap_id: &Hash) -> Result<Swap, BlockchainError> {
        let data = self.get_struct_data(&SWAP_KEY_ADDRESS, swap_id.as_bytes());
        if data.is_empty() {
            return Err(BlockchainError::SwapNotFound(*swap_id));
        }
        let record: SwapRecord = rlp::decode(&data)
            .map_err(|e| BlockchainError::Corruption(format!("swap {swap_id}: {e}")))?;
        if record.deleted {
            return Err(BlockchainError::SwapNotFound(*swap_id));
        }
        Ok(record.swap)
    }

    pub fn add_swap(&mut self, swap: Swap) -> Result<(), BlockchainError> {
        if self.get_swap(&swap.id).is_ok() {
            return Err(BlockchainError::SwapExists(swap.id));
        }
        self.put_swap(swap, false);
        Ok(())
    }

    pub fn update_swap(&mut self, swap: Swap) -> Result<(), BlockchainError> {
        self.put_swap(swap, false);
        Ok(())
    }

    pub fn remove_swap(&mut self, swap_id: &Hash) -> Result<(), BlockchainError> {
        let swap = self.get_swap(swap_id)?;
        self.put_swap(swap, true);
        Ok(())
    }

    fn put_swap(&mut self, swap: Swap, deleted: bool) {
        let id = swap.id;
        let record = SwapRecord { deleted, swap };
        let data = rlp::encode(&record).to_vec();
        self.set_struct_data(&SWAP_KEY_ADDRESS, id.as_bytes(), &data);
    }

    // ----- multi swap registry -----

    pub fn get_multi_swap(&self, swap_id: &Hash) -> Result<MultiSwap, BlockchainError> {
        let data = self.get_struct_data(&MULTI_SWAP_KEY_ADDRESS, swap_id.as_bytes());
        if data.is_empty() {
            return Err(BlockchainError::SwapNotFound(*swap_id));
        }
        let record: MultiSwapRecord = rlp::decode(&data)
            .map_err(|e| BlockchainError::Corruption(format!("multi swap {swap_id}: {e}")))?;
        if record.deleted {
            return Err(BlockchainError::SwapNotFound(*swap_id));
        }
        Ok(record.swap)
    }

    pub fn add_multi_swap(&mut self, swap: MultiSwap) -> Result<(), BlockchainError> {
        if self.get_multi_swap(&swap.id).is_ok() {
            return Err(BlockchainError::SwapExists(swap.id));
        }
        self.put_multi_swap(swap, false);
        Ok(())
    }

    pub fn update_multi_swap(&mut self, swap: MultiSwap) -> Result<(), BlockchainError> {
        self.put_multi_swap(swap, false);
        Ok(())
    }

    pub fn remove_multi_swap(&mut self, swap_id: &Hash) -> Result<(), BlockchainError> {
        let swap = self.get_multi_swap(swap_id)?;
        self.put_multi_swap(swap, true);
        Ok(())
    }

    fn put_multi_swap(&mut self, swap: MultiSwap, deleted: bool) {
        let id = swap.id;
        let record = MultiSwapRecord { deleted, swap };
        let data = rlp::encode(&record).to_vec();
        self.set_struct_data(&MULTI_SWAP_KEY_ADDRESS, id.as_bytes(), &data);
    }

    // ----- report registry -----

    pub fn is_report_exist(&self, report: &[u8]) -> bool {
        let hash = keccak256(report);
        !self
            .get_struct_data(&REPORT_KEY_ADDRESS, hash.as_bytes())
            .is_empty()
    }

    pub fn add_report(&mut self, report: &[u8]) -> Result<(), BlockchainError> {
        if self.is_report_exist(report) {
            return Err(BlockchainError::ReportExists);
        }
        let hash = keccak256(report);
        self.set_struct_data(&REPORT_KEY_ADDRESS, hash.as_bytes(), report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn sample_asset(id_byte: u8) -> Asset {
        Asset {
            id: Hash::repeat_byte(id_byte),
            owner: Address::repeat_byte(0x01),
            name: "Coin".into(),
            symbol: "C".into(),
            decimals: 18,
            total: U256::from(100u64),
            can_change: true,
            description: String::new(),
        }
    }

    fn sample_swap(id_byte: u8) -> Swap {
        Swap {
            id: Hash::repeat_byte(id_byte),
            owner: Address::repeat_byte(0x01),
            from_asset_id: Hash::repeat_byte(0x02),
            from_start_time: 0,
            from_end_time: u64::MAX,
            min_from_amount: U256::one(),
            to_asset_id: Hash::repeat_byte(0x03),
            to_start_time: 0,
            to_end_time: u64::MAX,
            min_to_amount: U256::one(),
            swap_size: U256::from(10u64),
            targets: vec![],
            time: 0,
            description: String::new(),
            notation: 0,
        }
    }

    #[test]
    fn test_asset_registry() {
        let mut state = StateDB::new();
        let asset = sample_asset(0x0a);

        assert!(state.get_asset(&asset.id).is_err());
        state.gen_asset(asset.clone()).expect("registered");
        assert_eq!(state.get_asset(&asset.id).expect("found"), asset);
        assert!(matches!(
            state.gen_asset(asset.clone()),
            Err(BlockchainError::AssetExists(_))
        ));

        let mut updated = asset.clone();
        updated.total = U256::from(500u64);
        state.update_asset(updated.clone()).expect("updated");
        assert_eq!(state.get_asset(&asset.id).expect("found"), updated);
    }

    #[test]
    fn test_swap_tombstone() {
        let mut state = StateDB::new();
        let swap = sample_swap(0x0b);

        state.add_swap(swap.clone()).expect("added");
        assert!(state.add_swap(swap.clone()).is_err());

        state.remove_swap(&swap.id).expect("removed");
        assert!(matches!(
            state.get_swap(&swap.id),
            Err(BlockchainError::SwapNotFound(_))
        ));
        assert!(state.remove_swap(&swap.id).is_err());
    }

    #[test]
    fn test_report_registry() {
        let mut state = StateDB::new();
        let report = vec![1u8, 2, 3];

        assert!(!state.is_report_exist(&report));
        state.add_report(&report).expect("recorded");
        assert!(state.is_report_exist(&report));
        assert!(matches!(
            state.add_report(&report),
            Err(BlockchainError::ReportExists)
        ));
    }
}
