use super::{
    ParamError, MAX_ASSET_NAME_LEN, MAX_ASSET_SYMBOL_LEN, MAX_DESCRIPTION_LEN,
    MAX_TRANSAC_DATA_LEN,
};
use crate::asset::Asset;
use crate::crypto::{Address, Hash};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// Parameters of a user-generated asset. The id and owner are not part
/// of the payload; they derive from the creating transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenAssetParam {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total: U256,
    pub can_change: bool,
    pub description: String,
}

impl GenAssetParam {
    pub fn check(&self, _height: u64) -> Result<(), ParamError> {
        if self.name.is_empty() || self.symbol.is_empty() {
            return Err(ParamError::EmptyName);
        }
        if self.name.len() > MAX_ASSET_NAME_LEN || self.symbol.len() > MAX_ASSET_SYMBOL_LEN {
            return Err(ParamError::NameTooLong);
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(ParamError::DescriptionTooLong);
        }
        if self.total.is_zero() && !self.can_change {
            return Err(ParamError::ZeroValue);
        }
        Ok(())
    }

    /// Materialize the registry record; id and owner are filled by the
    /// dispatcher from the creating transaction.
    pub fn to_asset(&self) -> Asset {
        Asset {
            id: Hash::zero(),
            owner: Address::zero(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            total: self.total,
            can_change: self.can_change,
            description: self.description.clone(),
        }
    }
}

impl Encodable for GenAssetParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        s.append(&self.name);
        s.append(&self.symbol);
        s.append(&self.decimals);
        s.append(&self.total);
        s.append(&self.can_change);
        s.append(&self.description);
    }
}

impl Decodable for GenAssetParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            name: rlp.val_at(0)?,
            symbol: rlp.val_at(1)?,
            decimals: rlp.val_at(2)?,
            total: rlp.val_at(3)?,
            can_change: rlp.val_at(4)?,
            description: rlp.val_at(5)?,
        })
    }
}

/// Plain transfer of asset units between accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAssetParam {
    pub asset_id: Hash,
    pub to: Address,
    pub value: U256,
}

impl SendAssetParam {
    pub fn check(&self, _height: u64) -> Result<(), ParamError> {
        if self.asset_id.is_zero() {
            return Err(ParamError::ZeroAssetId);
        }
        if self.value.is_zero() {
            return Err(ParamError::ZeroValue);
        }
        Ok(())
    }
}

impl Encodable for SendAssetParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.asset_id);
        s.append(&self.to);
        s.append(&self.value);
    }
}

impl Decodable for SendAssetParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            asset_id: rlp.val_at(0)?,
            to: rlp.val_at(1)?,
            value: rlp.val_at(2)?,
        })
    }
}

/// Owner-driven mint or burn of a `can_change` asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValueChangeParam {
    pub asset_id: Hash,
    pub to: Address,
    pub value: U256,
    pub is_inc: bool,
    pub transac_data: String,
}

impl AssetValueChangeParam {
    pub fn check(&self, _height: u64) -> Result<(), ParamError> {
        if self.asset_id.is_zero() {
            return Err(ParamError::ZeroAssetId);
        }
        if self.value.is_zero() {
            return Err(ParamError::ZeroValue);
        }
        if self.transac_data.len() > MAX_TRANSAC_DATA_LEN {
            return Err(ParamError::DescriptionTooLong);
        }
        Ok(())
    }
}

impl Encodable for AssetValueChangeParam {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.asset_id);
        s.append(&self.to);
        s.append(&self.value);
        s.append(&self.is_inc);
        s.append(&self.transac_data);
    }
}

impl Decodable for AssetValueChangeParam {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            asset_id: rlp.val_at(0)?,
            to: rlp.val_at(1)?,
            value: rlp.val_at(2)?,
            is_inc: rlp.val_at(3)?,
            transac_data: rlp.val_at(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_asset_check() {
        let mut param = GenAssetParam {
            name: "Test".into(),
            symbol: "TST".into(),
            decimals: 8,
            total: U256::from(1000u64),
            can_change: false,
            description: String::new(),
        };
        assert!(param.check(1).is_ok());

        param.name.clear();
        assert_eq!(param.check(1), Err(ParamError::EmptyName));

        param.name = "Test".into();
        param.total = U256::zero();
        assert_eq!(param.check(1), Err(ParamError::ZeroValue));
        param.can_change = true;
        assert!(param.check(1).is_ok());
    }

    #[test]
    fn test_send_asset_check() {
        let param = SendAssetParam {
            asset_id: Hash::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value: U256::zero(),
        };
        assert_eq!(param.check(1), Err(ParamError::ZeroValue));
    }

    #[test]
    fn test_rlp_roundtrips() {
        let gen = GenAssetParam {
            name: "Test".into(),
            symbol: "TST".into(),
            decimals: 18,
            total: U256::from(42u64),
            can_change: true,
            description: "a token".into(),
        };
        let decoded: GenAssetParam = rlp::decode(&rlp::encode(&gen)).expect("decodes");
        assert_eq!(gen, decoded);

        let change = AssetValueChangeParam {
            asset_id: Hash::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            value: U256::from(5u64),
            is_inc: false,
            transac_data: String::new(),
        };
        let decoded: AssetValueChangeParam = rlp::decode(&rlp::encode(&change)).expect("decodes");
        assert_eq!(change, decoded);
    }
}
