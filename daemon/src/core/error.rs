use primitive_types::U256;
use tempo_common::crypto::{Address, Hash};
use tempo_common::swap::NotSwapTarget;
use tempo_common::ticket::TicketError;
use tempo_common::timelock::TimeLockError;
use tempo_common::transaction::payload::ParamError;
use thiserror::Error;

/// Every failure surfaced by the node core. Non-fatal kinds roll the
/// enclosing transaction back; `Corruption` and `Decode` abort block
/// processing.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("invalid parameter: {0}")]
    InvalidParam(#[from] ParamError),

    #[error(transparent)]
    TimeLock(#[from] TimeLockError),

    #[error("not enough asset")]
    InsufficientAssetBalance,

    #[error("not enough time lock balance")]
    InsufficientTimeLockBalance,

    #[error("not enough time lock or asset balance")]
    InsufficientMixedBalance,

    #[error("not enough balance")]
    InsufficientBalance,

    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: U256, need: U256 },

    #[error("account {address} already has a notation: {notation}")]
    NotationExists { address: Address, notation: u64 },

    #[error("notation {0} does not exist")]
    NotationNotFound(u64),

    #[error("the from address does not have a notation")]
    NoNotation,

    #[error("notation in swap is no longer valid")]
    NotationMismatch,

    #[error("this notation does not belong to the from address")]
    NotationNotOwned,

    #[error("asset {0} not found")]
    AssetNotFound(Hash),

    #[error("asset {0} already exists")]
    AssetExists(Hash),

    #[error("asset can't inc or dec")]
    AssetNotChangeable,

    #[error("asset can only be changed by owner")]
    NotAssetOwner,

    #[error("decrement can only happen to asset's own account")]
    DecrementNotOwnAccount,

    #[error("swap {0} not found")]
    SwapNotFound(Hash),

    #[error("swap {0} already exists")]
    SwapExists(Hash),

    #[error("must be swap owner to recall")]
    NotSwapOwner,

    #[error(transparent)]
    NotSwapTarget(#[from] NotSwapTarget),

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error("report already exists")]
    ReportExists,

    #[error("invalid double mining report: {0}")]
    InvalidReport(&'static str),

    #[error("already reported in pool")]
    ReportInPool,

    #[error("sender already has a buy ticket transaction in pool")]
    BuyTicketInPool,

    #[error("{0} not enabled")]
    NotEnabled(&'static str),

    #[error("unsupported call func")]
    UnsupportedFunc,

    #[error("cached tickets hash mismatch")]
    CachedTicketsHashMismatch,

    #[error("amount overflow")]
    Overflow,

    // native contract bridge
    #[error("unknown func type")]
    UnknownBridgeFunc,

    #[error("wrong time range")]
    WrongTimeRange,

    #[error("value overflow")]
    ValueOverflow,

    #[error("wrong length of input")]
    WrongInputLength,

    #[error("invalid send asset flag")]
    InvalidSendAssetFlag,

    #[error("must call by contract")]
    MustCallByContract,

    #[error("receiveAsset tx receiver must be contract")]
    ReceiverMustBeContract,

    #[error("corrupted state data: {0}")]
    Corruption(String),

    #[error("decode error: {0}")]
    Decode(#[from] rlp::DecoderError),
}

impl BlockchainError {
    /// Whether the failure must abort block processing instead of
    /// rolling back a single transaction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BlockchainError::Corruption(_) | BlockchainError::Decode(_)
        )
    }
}
