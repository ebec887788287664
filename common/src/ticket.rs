use crate::config::ticket_price;
use crate::crypto::{keccak256_concat, Address, Hash};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("ticket {0} already exists")]
    Exists(Hash),

    #[error("ticket {0} not found")]
    NotFound(Hash),

    #[error("ticket blob is corrupted: {0}")]
    Blob(String),
}

/// A burn-backed mining entry. The value is not stored; it is the
/// ticket price at the purchase height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketBody {
    pub id: Hash,
    pub height: u64,
    pub start_time: u64,
    pub expire_time: u64,
}

impl TicketBody {
    pub fn value(&self) -> U256 {
        ticket_price(self.height)
    }
}

/// Ticket ids are bound to the buyer and the parent block, which makes
/// a second purchase within the same block a detectable collision.
pub fn ticket_id(owner: &Address, parent_hash: &Hash) -> Hash {
    keccak256_concat(&[owner.as_bytes(), parent_hash.as_bytes()])
}

impl Encodable for TicketBody {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.id);
        s.append(&self.height);
        s.append(&self.start_time);
        s.append(&self.expire_time);
    }
}

impl Decodable for TicketBody {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            id: rlp.val_at(0)?,
            height: rlp.val_at(1)?,
            start_time: rlp.val_at(2)?,
            expire_time: rlp.val_at(3)?,
        })
    }
}

/// A ticket together with its owner, as returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub owner: Address,
    pub body: TicketBody,
}

/// All tickets of one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketsData {
    pub owner: Address,
    pub tickets: Vec<TicketBody>,
}

impl Encodable for TicketsData {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.owner);
        s.append_list(&self.tickets);
    }
}

impl Decodable for TicketsData {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self {
            owner: rlp.val_at(0)?,
            tickets: rlp.list_at(1)?,
        })
    }
}

/// The full ticket set, grouped per owner. Group order is insertion
/// order so the persisted blob is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketsDataSlice(Vec<TicketsData>);

impl TicketsDataSlice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[TicketsData] {
        &self.0
    }

    pub fn get(&self, id: &Hash) -> Option<Ticket> {
        for group in &self.0 {
            if let Some(body) = group.tickets.iter().find(|t| t.id == *id) {
                return Some(Ticket {
                    owner: group.owner,
                    body: body.clone(),
                });
            }
        }
        None
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.get(id).is_some()
    }

    pub fn add_ticket(&mut self, owner: Address, body: TicketBody) -> Result<(), TicketError> {
        if self.contains(&body.id) {
            return Err(TicketError::Exists(body.id));
        }
        match self.0.iter_mut().find(|g| g.owner == owner) {
            Some(group) => group.tickets.push(body),
            None => self.0.push(TicketsData {
                owner,
                tickets: vec![body],
            }),
        }
        Ok(())
    }

    pub fn remove_ticket(&mut self, id: &Hash) -> Result<(), TicketError> {
        for group in self.0.iter_mut() {
            if let Some(pos) = group.tickets.iter().position(|t| t.id == *id) {
                group.tickets.remove(pos);
                self.0.retain(|g| !g.tickets.is_empty());
                return Ok(());
            }
        }
        Err(TicketError::NotFound(*id))
    }

    /// Drop tickets whose expire time is at or before `timestamp`.
    pub fn clear_expired(&mut self, timestamp: u64) {
        for group in self.0.iter_mut() {
            group.tickets.retain(|t| t.expire_time > timestamp);
        }
        self.0.retain(|g| !g.tickets.is_empty());
    }

    pub fn number_of_tickets(&self) -> u64 {
        self.0.iter().map(|g| g.tickets.len() as u64).sum()
    }

    pub fn number_of_tickets_by(&self, owner: &Address) -> u64 {
        self.0
            .iter()
            .find(|g| g.owner == *owner)
            .map(|g| g.tickets.len() as u64)
            .unwrap_or(0)
    }

    pub fn owned_by(&self, owner: &Address) -> &[TicketBody] {
        self.0
            .iter()
            .find(|g| g.owner == *owner)
            .map(|g| g.tickets.as_slice())
            .unwrap_or(&[])
    }

    /// Remove and return the whole group of an owner.
    pub fn take_owner(&mut self, owner: &Address) -> Option<TicketsData> {
        let pos = self.0.iter().position(|g| g.owner == *owner)?;
        Some(self.0.remove(pos))
    }
}

impl Encodable for TicketsDataSlice {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append_list(&self.0);
    }
}

impl Decodable for TicketsDataSlice {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Self(rlp.as_list()?))
    }
}

/// Persisted form of the ticket set: gzip over the RLP list.
pub fn encode_tickets_blob(tickets: &TicketsDataSlice) -> Result<Vec<u8>, TicketError> {
    let encoded = rlp::encode(tickets);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&encoded)
        .map_err(|e| TicketError::Blob(e.to_string()))?;
    encoder.finish().map_err(|e| TicketError::Blob(e.to_string()))
}

pub fn decode_tickets_blob(blob: &[u8]) -> Result<TicketsDataSlice, TicketError> {
    let mut decoder = GzDecoder::new(blob);
    let mut data = Vec::new();
    decoder
        .read_to_end(&mut data)
        .map_err(|e| TicketError::Blob(e.to_string()))?;
    rlp::decode(&data).map_err(|e| TicketError::Blob(e.to_string()))
}
