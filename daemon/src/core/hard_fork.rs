//! Network-upgrade side effects applied at fork boundaries.

use crate::core::state::StateDB;
use log::info;
use tempo_common::config::{hard_fork_height, VOTE1_DRAIN_LIST, VOTE1_REFUND_ADDRESS};

/// Drain the fork-1 address list into the refund address. Tickets are
/// refunded as time locks, notations are burned and every balance
/// entry moves over.
pub fn apply_vote1_hard_fork(state: &mut StateDB, height: u64, timestamp: u64) {
    for addr in VOTE1_DRAIN_LIST {
        info!("fork 1: draining {addr} into the refund address");
        state.transfer_all(addr, &VOTE1_REFUND_ADDRESS, height, timestamp);
    }
}

/// Run every fork side effect scheduled exactly at `height`.
pub fn apply_hard_forks(state: &mut StateDB, height: u64, timestamp: u64) {
    if hard_fork_height(1) == Some(height) {
        apply_vote1_hard_fork(state, height, timestamp);
    }
}
