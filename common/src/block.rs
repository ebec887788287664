use crate::crypto::{keccak256, Address, Hash};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// The header view needed by the asset core: chain linkage, the
/// sealing miner and the timestamp. Double-mining reports carry a pair
/// of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub parent_hash: Hash,
    pub miner: Address,
    pub number: u64,
    pub time: u64,
    pub extra: Vec<u8>,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash {
        keccak256(&rlp::encode(self))
    }
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.parent_hash);
        s.append(&self.miner);
        s.append(&self.number);
        s.append(&self.time);
        s.append(&self.extra);
    }
}

impl Decodable for BlockHeader {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            parent_hash: rlp.val_at(0)?,
            miner: rlp.val_at(1)?,
            number: rlp.val_at(2)?,
            time: rlp.val_at(3)?,
            extra: rlp.val_at(4)?,
        })
    }
}
