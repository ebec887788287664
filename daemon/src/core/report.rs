//! Double-mining reports: a report is the RLP pair of two distinct
//! headers sealed by the same miner at the same height. Verification
//! of the seal itself lives with the consensus engine; the core checks
//! the structural twin conditions, the recency window and duplication,
//! then punishes the offender by deleting every ticket they own.

use crate::core::error::BlockchainError;
use crate::core::state::StateDB;
use log::info;
use rlp::Rlp;
use tempo_common::block::BlockHeader;
use tempo_common::config::REPORT_WINDOW;
use tempo_common::crypto::{Address, Hash};

/// Serialize a header pair into report form.
pub fn encode_report(header1: &BlockHeader, header2: &BlockHeader) -> Vec<u8> {
    let mut s = rlp::RlpStream::new_list(2);
    s.append(header1);
    s.append(header2);
    s.out().to_vec()
}

/// Validate a candidate report against the current state. `height` is
/// the block height the report executes at; `None` skips the recency
/// window (pool checks run against an unknown future height).
pub fn check_adding_report(
    state: &StateDB,
    report: &[u8],
    height: Option<u64>,
) -> Result<(BlockHeader, BlockHeader), BlockchainError> {
    let rlp = Rlp::new(report);
    let header1: BlockHeader = rlp
        .val_at(0)
        .map_err(|_| BlockchainError::InvalidReport("malformed header pair"))?;
    let header2: BlockHeader = rlp
        .val_at(1)
        .map_err(|_| BlockchainError::InvalidReport("malformed header pair"))?;

    if header1.number != header2.number {
        return Err(BlockchainError::InvalidReport("heights differ"));
    }
    if header1.miner != header2.miner {
        return Err(BlockchainError::InvalidReport("miners differ"));
    }
    if header1.hash() == header2.hash() {
        return Err(BlockchainError::InvalidReport("headers are identical"));
    }
    if let Some(current) = height {
        if header1.number >= current {
            return Err(BlockchainError::InvalidReport("reported height not final"));
        }
        if current - header1.number > REPORT_WINDOW {
            return Err(BlockchainError::InvalidReport("report too old"));
        }
    }
    if state.is_report_exist(report) {
        return Err(BlockchainError::ReportExists);
    }
    Ok((header1, header2))
}

/// Punish the double miner: delete every ticket they own. Returns the
/// deleted ticket ids for the receipt log.
pub fn process_report(
    header1: &BlockHeader,
    _header2: &BlockHeader,
    reporter: &Address,
    state: &mut StateDB,
    _height: u64,
    _timestamp: u64,
) -> Result<Vec<Hash>, BlockchainError> {
    let offender = header1.miner;
    let tickets = state.all_tickets()?;
    let ids: Vec<Hash> = tickets.owned_by(&offender).iter().map(|t| t.id).collect();
    for id in &ids {
        state.remove_ticket(id)?;
    }
    info!(
        "double mining at height {} by {}, reported by {}: {} tickets deleted",
        header1.number,
        offender,
        reporter,
        ids.len()
    );
    Ok(ids)
}
