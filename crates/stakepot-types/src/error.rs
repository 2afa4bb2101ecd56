//! Error types for the Stakepot escrow.
//!
//! All errors use the `SP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Lobby lifecycle errors
//! - 2xx: Membership errors
//! - 3xx: Settlement errors
//! - 4xx: Attestation errors
//! - 5xx: Fee errors
//! - 6xx: Custody / withdrawal errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::LobbyId;

/// Central error enum for all Stakepot operations.
///
/// Every variant is returned before any state is mutated; a failed call
/// leaves the store, ledger and custody exactly as they were.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakepotError {
    // =================================================================
    // Lobby Lifecycle Errors (1xx)
    // =================================================================
    /// No lobby exists with this identifier.
    #[error("SP_ERR_100: Lobby not found: {0}")]
    LobbyNotFound(LobbyId),

    /// Stake must be strictly positive.
    #[error("SP_ERR_101: Invalid stake: {0}")]
    InvalidStake(Decimal),

    /// Public capacity must be at least 1 and within the configured bound.
    #[error("SP_ERR_102: Invalid capacity: {0}")]
    InvalidCapacity(usize),

    /// The lobby has been started; no further joins are accepted.
    #[error("SP_ERR_103: Lobby is locked")]
    LobbyLocked,

    /// The lobby was already started.
    #[error("SP_ERR_104: Lobby already locked")]
    AlreadyLocked,

    /// Settlement attempted before the creator started the lobby.
    #[error("SP_ERR_105: Lobby is not locked")]
    LobbyNotLocked,

    /// The lobby has fewer participants than the configured minimum.
    #[error("SP_ERR_106: Not enough participants: need {needed}, have {actual}")]
    NotEnoughParticipants { needed: usize, actual: usize },

    // =================================================================
    // Membership Errors (2xx)
    // =================================================================
    /// The caller is not allowed to perform this operation.
    #[error("SP_ERR_200: Unauthorized")]
    Unauthorized,

    /// The public lobby has reached its capacity.
    #[error("SP_ERR_201: Lobby is full")]
    LobbyFull,

    /// The identity is already a participant of this lobby.
    #[error("SP_ERR_202: Already joined")]
    AlreadyJoined,

    /// The conveyed value differs from the lobby's stake.
    #[error("SP_ERR_203: Wrong stake: expected {expected}, got {actual}")]
    WrongStake { expected: Decimal, actual: Decimal },

    /// The private whitelist is empty, oversized or contains duplicates.
    #[error("SP_ERR_204: Invalid whitelist: {reason}")]
    InvalidWhitelist { reason: String },

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// The lobby has already been settled.
    #[error("SP_ERR_300: Lobby already ended")]
    AlreadyEnded,

    /// The payout vector does not line up with the participant list.
    #[error("SP_ERR_301: Payout length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A payout entry is negative.
    #[error("SP_ERR_302: Invalid payout at index {index}")]
    InvalidPayout { index: usize },

    /// The payouts claim more than the pot can cover.
    #[error("SP_ERR_303: Payouts exceed pot: requested {requested}, available {available}")]
    PayoutExceedsPot {
        requested: Decimal,
        available: Decimal,
    },

    // =================================================================
    // Attestation Errors (4xx)
    // =================================================================
    /// The payout attestation was not signed by the configured authority.
    #[error("SP_ERR_400: Bad signature")]
    BadSignature,

    // =================================================================
    // Fee Errors (5xx)
    // =================================================================
    /// Fee percentage outside 0..=100.
    #[error("SP_ERR_500: Invalid fee: {0}%")]
    InvalidFee(u8),

    // =================================================================
    // Custody / Withdrawal Errors (6xx)
    // =================================================================
    /// The caller has no withdrawable balance.
    #[error("SP_ERR_600: Nothing to withdraw")]
    NothingToWithdraw,

    /// The caller's wallet cannot cover the conveyed value.
    #[error("SP_ERR_601: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// The value custody collaborator rejected a transfer.
    #[error("SP_ERR_602: Custody transfer failed: {reason}")]
    CustodyFailed { reason: String },

    /// Custodied value no longer matches pots plus withdrawable balances.
    #[error("SP_ERR_603: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Amount arithmetic overflowed.
    #[error("SP_ERR_900: Arithmetic overflow")]
    ArithmeticOverflow,

    /// Configuration error (invalid file, out-of-range values, etc.).
    #[error("SP_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("SP_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, StakepotError>;

impl From<serde_json::Error> for StakepotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
