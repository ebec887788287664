//! Process-wide cache of decompressed ticket sets, keyed by the
//! content hash of the gzipped blob. Decoding the blob is the single
//! most expensive state read, and consecutive blocks usually share the
//! ticket set, so a small FIFO ring amortizes it across StateDB
//! instances.

use crate::core::error::BlockchainError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tempo_common::crypto::{keccak256, Hash};
use tempo_common::ticket::{encode_tickets_blob, TicketsDataSlice};

const MAX_CACHED_TICKETS: usize = 101;

#[derive(Clone, Default)]
struct CachedTickets {
    hash: Hash,
    tickets: TicketsDataSlice,
}

struct Ring {
    entries: Vec<CachedTickets>,
    start: usize,
    end: usize,
}

/// Fixed-capacity FIFO ring guarded by a reader/writer lock. Many
/// concurrent readers, serialized writers; membership is checked under
/// the shared lock before the exclusive lock is taken.
pub struct CachedTicketSlice {
    ring: RwLock<Ring>,
}

impl CachedTicketSlice {
    fn new() -> Self {
        Self {
            ring: RwLock::new(Ring {
                entries: vec![CachedTickets::default(); MAX_CACHED_TICKETS],
                start: 0,
                end: 0,
            }),
        }
    }

    pub fn add(&self, hash: Hash, tickets: &TicketsDataSlice) {
        if self.get(&hash).is_some() {
            return;
        }

        let mut ring = self.ring.write();
        let end = ring.end;
        ring.entries[end] = CachedTickets {
            hash,
            tickets: tickets.clone(),
        };
        ring.end = (end + 1) % MAX_CACHED_TICKETS;
        if ring.end == ring.start {
            ring.start = (ring.start + 1) % MAX_CACHED_TICKETS;
        }
    }

    pub fn get(&self, hash: &Hash) -> Option<TicketsDataSlice> {
        if hash.is_zero() {
            return Some(TicketsDataSlice::new());
        }

        let ring = self.ring.read();
        let mut i = ring.start;
        while i != ring.end {
            if ring.entries[i].hash == *hash {
                return Some(ring.entries[i].tickets.clone());
            }
            i = (i + 1) % MAX_CACHED_TICKETS;
        }
        None
    }
}

static CACHED_TICKET_SLICE: Lazy<CachedTicketSlice> = Lazy::new(CachedTicketSlice::new);

pub fn get_cached_tickets(hash: &Hash) -> Option<TicketsDataSlice> {
    CACHED_TICKET_SLICE.get(hash)
}

pub fn cache_tickets(hash: Hash, tickets: &TicketsDataSlice) {
    CACHED_TICKET_SLICE.add(hash, tickets);
}

/// Insert a ticket set under the given content hash, verifying that
/// the hash really is the keccak of the re-encoded blob.
pub fn add_cached_tickets(
    hash: &Hash,
    tickets: &TicketsDataSlice,
) -> Result<(), BlockchainError> {
    let blob = encode_tickets_blob(tickets)?;
    if keccak256(&blob) != *hash {
        return Err(BlockchainError::CachedTicketsHashMismatch);
    }
    CACHED_TICKET_SLICE.add(*hash, tickets);
    Ok(())
}
