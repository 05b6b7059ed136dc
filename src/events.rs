//! Ledger events
//!
//! Appended to the DAO's event log by every successful mutating operation.
//! A failed operation is rolled back together with any event it produced.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, ProposalId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DaoEvent {
    DaoInitialized {
        admin: Address,
        contribution_end: Timestamp,
        vote_time: u64,
        quorum_percent: u8,
        timestamp: Timestamp,
    },
    Contributed {
        investor: Address,
        amount: Amount,
        total_shares: Amount,
        timestamp: Timestamp,
    },
    SharesRedeemed {
        investor: Address,
        amount: Amount,
        timestamp: Timestamp,
    },
    SharesTransferred {
        from: Address,
        to: Address,
        amount: Amount,
        timestamp: Timestamp,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        name: String,
        amount: Amount,
        recipient: Address,
        end: Timestamp,
        timestamp: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        weight: Amount,
        total_votes: Amount,
        timestamp: Timestamp,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
        recipient: Address,
        amount: Amount,
        timestamp: Timestamp,
    },
    FundsWithdrawn {
        to: Address,
        amount: Amount,
        timestamp: Timestamp,
    },
}

impl DaoEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            DaoEvent::DaoInitialized { timestamp, .. }
            | DaoEvent::Contributed { timestamp, .. }
            | DaoEvent::SharesRedeemed { timestamp, .. }
            | DaoEvent::SharesTransferred { timestamp, .. }
            | DaoEvent::ProposalCreated { timestamp, .. }
            | DaoEvent::VoteCast { timestamp, .. }
            | DaoEvent::ProposalExecuted { timestamp, .. }
            | DaoEvent::FundsWithdrawn { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = DaoEvent::FundsWithdrawn {
            to: Address::from("payee"),
            amount: 3,
            timestamp: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"funds_withdrawn\""));
        assert!(json.contains("\"to\":\"payee\""));
        assert_eq!(event.timestamp(), 42);
    }
}
