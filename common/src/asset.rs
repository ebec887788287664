use crate::crypto::{Address, Hash};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// On-chain fungible token record. The id binds the asset to its
/// creating transaction; `can_change` permits owner-driven mint and
/// burn after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Hash,
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total: U256,
    pub can_change: bool,
    pub description: String,
}

impl Encodable for Asset {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(8);
        s.append(&self.id);
        s.append(&self.owner);
        s.append(&self.name);
        s.append(&self.symbol);
        s.append(&self.decimals);
        s.append(&self.total);
        s.append(&self.can_change);
        s.append(&self.description);
    }
}

impl Decodable for Asset {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            id: rlp.val_at(0)?,
            owner: rlp.val_at(1)?,
            name: rlp.val_at(2)?,
            symbol: rlp.val_at(3)?,
            decimals: rlp.val_at(4)?,
            total: rlp.val_at(5)?,
            can_change: rlp.val_at(6)?,
            description: rlp.val_at(7)?,
        })
    }
}
