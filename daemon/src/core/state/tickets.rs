//! Ticket set accessors. The whole set is persisted as one gzipped
//! RLP blob under the ticket system account; decoding is memoized in
//! the StateDB and in the process-wide ring cache keyed by the blob's
//! content hash.

use super::ticket_cache;
use super::StateDB;
use crate::core::error::BlockchainError;
use log::{debug, error};
use tempo_common::config::{SYSTEM_ASSET_ID, TICKET_KEY_ADDRESS};
use tempo_common::crypto::{Address, Hash};
use tempo_common::ticket::{
    decode_tickets_blob, encode_tickets_blob, Ticket, TicketBody, TicketError, TicketsDataSlice,
};
use tempo_common::timelock::{new_time_lock, TimeLock};

impl StateDB {
    /// The full ticket set, decoded lazily and memoized.
    pub fn all_tickets(&mut self) -> Result<TicketsDataSlice, BlockchainError> {
        if let Some(tickets) = self.tickets_memo() {
            if tickets.number_of_tickets() != 0 {
                return Ok(tickets.clone());
            }
        }

        let key = self.get_data_hash(&TICKET_KEY_ADDRESS);
        if let Some(tickets) = ticket_cache::get_cached_tickets(&key) {
            self.set_tickets_memo(tickets.clone());
            return Ok(tickets);
        }

        let blob = self.get_data(&TICKET_KEY_ADDRESS);
        if blob.is_empty() {
            let empty = TicketsDataSlice::new();
            self.set_tickets_memo(empty.clone());
            return Ok(empty);
        }

        let tickets = decode_tickets_blob(&blob).map_err(|e| {
            error!("unable to decode tickets blob: {e}");
            BlockchainError::Corruption(format!("tickets blob: {e}"))
        })?;
        self.set_tickets_memo(tickets.clone());
        ticket_cache::cache_tickets(key, &tickets);
        Ok(tickets)
    }

    pub fn is_ticket_exist(&mut self, id: &Hash) -> bool {
        match self.all_tickets() {
            Ok(tickets) => tickets.contains(id),
            Err(_) => {
                error!("is_ticket_exist unable to retrieve all tickets");
                false
            }
        }
    }

    pub fn get_ticket(&mut self, id: &Hash) -> Result<Ticket, BlockchainError> {
        let tickets = self.all_tickets()?;
        tickets
            .get(id)
            .ok_or_else(|| TicketError::NotFound(*id).into())
    }

    pub fn add_ticket(&mut self, owner: Address, body: TicketBody) -> Result<(), BlockchainError> {
        let mut tickets = self.all_tickets()?;
        tickets.add_ticket(owner, body)?;
        self.set_tickets_memo(tickets);
        Ok(())
    }

    pub fn remove_ticket(&mut self, id: &Hash) -> Result<(), BlockchainError> {
        let mut tickets = self.all_tickets()?;
        tickets.remove_ticket(id)?;
        self.set_tickets_memo(tickets);
        Ok(())
    }

    pub fn total_number_of_tickets(&mut self) -> u64 {
        self.all_tickets()
            .map(|t| t.number_of_tickets())
            .unwrap_or(0)
    }

    /// Clear expired tickets, persist the set and refresh the caches.
    /// Returns the new content hash.
    pub fn update_tickets(
        &mut self,
        _height: u64,
        timestamp: u64,
    ) -> Result<Hash, BlockchainError> {
        let mut tickets = self.all_tickets()?;
        tickets.clear_expired(timestamp);

        let blob = encode_tickets_blob(&tickets)?;
        let hash = self.set_data(&TICKET_KEY_ADDRESS, blob);
        self.set_tickets_memo(tickets.clone());
        ticket_cache::cache_tickets(hash, &tickets);
        Ok(hash)
    }

    /// Drop every ticket of `from`, refunding each live one to `to` as
    /// a time lock of the system asset over the ticket's own epoch.
    pub fn clear_tickets(&mut self, from: &Address, to: &Address, height: u64, timestamp: u64) {
        let mut tickets = match self.all_tickets() {
            Ok(tickets) => tickets,
            Err(_) => return,
        };
        let Some(group) = tickets.take_owner(from) else {
            return;
        };
        self.set_tickets_memo(tickets);

        for ticket in &group.tickets {
            if ticket.expire_time <= timestamp {
                continue;
            }
            let refund: TimeLock =
                match new_time_lock(ticket.value(), ticket.start_time, ticket.expire_time) {
                    Ok(lock) => lock,
                    Err(e) => {
                        debug!("skipping malformed ticket refund {}: {e}", ticket.id);
                        continue;
                    }
                };
            self.add_timelock_balance(to, &SYSTEM_ASSET_ID, &refund, height, timestamp);
        }
    }
}
