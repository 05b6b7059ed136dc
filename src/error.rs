//! Ledger Errors
//!
//! Every failure a DAO operation can surface. Failures are detected before the
//! ledger is mutated (or rolled back before the lock is released), so an `Err`
//! always means "nothing happened".

use std::fmt;
use thiserror::Error;

use crate::types::{Address, Amount, ProposalId, Timestamp};

/// Error during a DAO operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaoError {
    #[error("Unauthorized: only the DAO admin can perform this action")]
    NotAdmin,

    #[error("Unauthorized: only investors can perform this action")]
    NotInvestor,

    #[error("Contribution window closed at {contribution_end} (now {now})")]
    ContributionWindowClosed {
        contribution_end: Timestamp,
        now: Timestamp,
    },

    #[error("Voting on proposal {proposal_id} closed at {end} (now {now})")]
    VotingClosed {
        proposal_id: ProposalId,
        end: Timestamp,
        now: Timestamp,
    },

    #[error("Voting on proposal {proposal_id} is open until {end} (now {now})")]
    VotingStillOpen {
        proposal_id: ProposalId,
        end: Timestamp,
        now: Timestamp,
    },

    #[error("Insufficient shares: need {need}, have {have}")]
    InsufficientShares { need: Amount, have: Amount },

    #[error("Insufficient available funds: need {need}, available {available}")]
    InsufficientFunds { need: Amount, available: Amount },

    #[error("Proposal amount {amount} exceeds available funds {available}")]
    AmountExceedsFunds { amount: Amount, available: Amount },

    #[error("{voter} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("Proposal {0} has already been executed")]
    AlreadyExecuted(ProposalId),

    #[error("Quorum not met on proposal {proposal_id}: {percent}% < {quorum}%")]
    QuorumNotMet {
        proposal_id: ProposalId,
        percent: u64,
        quorum: u8,
    },

    #[error("Quorum must be between 0 and 100, got {0}")]
    InvalidQuorum(u8),

    #[error("Proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("Transfer of {amount} to {to} failed: {reason}")]
    TransferFailed {
        to: Address,
        amount: Amount,
        reason: String,
    },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Ledger lock poisoned by an earlier panic")]
    LockPoisoned,

    #[error("Re-entrant call into the ledger rejected")]
    Reentrancy,

    #[error("DAO service is no longer running")]
    ServiceUnavailable,
}

/// Coarse failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    AccessDenied,
    WindowViolation,
    InsufficientResource,
    StateConflict,
    Configuration,
    Transfer,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::AccessDenied => "access denied",
            ErrorCategory::WindowViolation => "window violation",
            ErrorCategory::InsufficientResource => "insufficient resource",
            ErrorCategory::StateConflict => "state conflict",
            ErrorCategory::Configuration => "configuration error",
            ErrorCategory::Transfer => "transfer failure",
            ErrorCategory::Internal => "internal error",
        };
        f.write_str(name)
    }
}

impl DaoError {
    /// Which family of failure this is
    pub fn category(&self) -> ErrorCategory {
        match self {
            DaoError::NotAdmin | DaoError::NotInvestor => ErrorCategory::AccessDenied,
            DaoError::ContributionWindowClosed { .. }
            | DaoError::VotingClosed { .. }
            | DaoError::VotingStillOpen { .. } => ErrorCategory::WindowViolation,
            DaoError::InsufficientShares { .. }
            | DaoError::InsufficientFunds { .. }
            | DaoError::AmountExceedsFunds { .. } => ErrorCategory::InsufficientResource,
            DaoError::AlreadyVoted { .. }
            | DaoError::AlreadyExecuted(_)
            | DaoError::QuorumNotMet { .. }
            | DaoError::ProposalNotFound(_) => ErrorCategory::StateConflict,
            DaoError::InvalidQuorum(_) => ErrorCategory::Configuration,
            DaoError::TransferFailed { .. } => ErrorCategory::Transfer,
            DaoError::Overflow
            | DaoError::LockPoisoned
            | DaoError::Reentrancy
            | DaoError::ServiceUnavailable => ErrorCategory::Internal,
        }
    }
}

/// Result type for DAO operations
pub type DaoResult<T> = Result<T, DaoError>;
