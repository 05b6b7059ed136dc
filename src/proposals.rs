//! Proposal Registry
//!
//! Append-only set of spending proposals with sequential ids starting at 0.
//! Ids are never reused.
//!
//! Once a proposal's voting window has passed, the share supply it is judged
//! against is frozen on the proposal. Later redemptions or contributions no
//! longer move it between `Executable` and `Unexecutable`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DaoError, DaoResult};
use crate::types::{Address, Amount, ProposalId, Timestamp};

/// A request to pay `amount` from the treasury to `recipient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential proposal ID
    pub id: ProposalId,
    /// Short human-readable name
    pub name: String,
    /// Value reserved at creation and paid out on execution
    pub amount: Amount,
    /// Receiver of the payout
    pub recipient: Address,
    /// Cumulative share weight of the votes cast
    pub votes: Amount,
    /// Last second at which votes are accepted
    pub end: Timestamp,
    /// Whether the payout has been made
    pub executed: bool,
    /// Investor who created the proposal
    pub proposer: Address,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Total shares when voting closed; `None` while no later mutation has run
    #[serde(default)]
    pub closing_total_shares: Option<Amount>,
}

/// Lifecycle position of a proposal at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Voting is open (`now <= end`)
    Open,
    /// Voting closed with quorum met, waiting for the admin to execute
    Executable,
    /// Voting closed without quorum. Terminal; the reservation stays locked.
    Unexecutable,
    /// Paid out. Terminal.
    Executed,
}

impl Proposal {
    pub fn is_open(&self, now: Timestamp) -> bool {
        now <= self.end
    }

    /// Share supply the quorum is computed against
    pub fn quorum_denominator(&self, current_total_shares: Amount) -> Amount {
        self.closing_total_shares.unwrap_or(current_total_shares)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: ProposalId,
    /// Proposals whose closing supply is not recorded yet, ordered by end
    #[serde(default)]
    unsettled: BTreeSet<(Timestamp, ProposalId)>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created proposal will receive
    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn get(&self, id: ProposalId) -> DaoResult<&Proposal> {
        self.proposals.get(&id).ok_or(DaoError::ProposalNotFound(id))
    }

    pub fn get_mut(&mut self, id: ProposalId) -> DaoResult<&mut Proposal> {
        self.proposals
            .get_mut(&id)
            .ok_or(DaoError::ProposalNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Freeze `total_shares` on every proposal whose window closed before `now`.
    ///
    /// Must run before any mutation at `now`, so the recorded supply is the
    /// one in effect when voting ended.
    pub fn close_expired(&mut self, now: Timestamp, total_shares: Amount) {
        while let Some(&(end, id)) = self.unsettled.first() {
            if end >= now {
                break;
            }
            self.unsettled.pop_first();
            if let Some(proposal) = self.proposals.get_mut(&id) {
                proposal.closing_total_shares = Some(total_shares);
            }
        }
    }

    /// Register a new proposal whose voting window closes `vote_time` seconds
    /// after `now`. Funds must already be reserved by the caller.
    pub fn create(
        &mut self,
        name: String,
        amount: Amount,
        recipient: Address,
        proposer: Address,
        now: Timestamp,
        vote_time: u64,
    ) -> DaoResult<ProposalId> {
        let end = i64::try_from(vote_time)
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or(DaoError::Overflow)?;
        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or(DaoError::Overflow)?;

        self.proposals.insert(
            id,
            Proposal {
                id,
                name,
                amount,
                recipient,
                votes: 0,
                end,
                executed: false,
                proposer,
                created_at: now,
                closing_total_shares: None,
            },
        );
        self.unsettled.insert((end, id));
        self.next_id = next_id;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(registry: &mut ProposalRegistry, now: Timestamp) -> ProposalId {
        registry
            .create(
                "DAI".to_string(),
                1,
                Address::from("payee"),
                Address::from("alice"),
                now,
                10,
            )
            .unwrap()
    }

    #[test]
    fn test_sequential_ids() {
        let mut registry = ProposalRegistry::new();
        assert_eq!(registry.next_id(), 0);
        assert_eq!(create(&mut registry, 100), 0);
        assert_eq!(create(&mut registry, 100), 1);
        assert_eq!(registry.next_id(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_new_proposal_fields() {
        let mut registry = ProposalRegistry::new();
        let id = create(&mut registry, 1_000);
        let proposal = registry.get(id).unwrap();

        assert_eq!(proposal.name, "DAI");
        assert_eq!(proposal.amount, 1);
        assert_eq!(proposal.recipient, Address::from("payee"));
        assert_eq!(proposal.votes, 0);
        assert_eq!(proposal.end, 1_010);
        assert!(!proposal.executed);
    }

    #[test]
    fn test_open_window_is_inclusive() {
        let mut registry = ProposalRegistry::new();
        let id = create(&mut registry, 0);
        let proposal = registry.get(id).unwrap();
        assert!(proposal.is_open(10));
        assert!(!proposal.is_open(11));
    }

    #[test]
    fn test_close_expired_freezes_supply_once() {
        let mut registry = ProposalRegistry::new();
        let early = create(&mut registry, 0);
        let late = create(&mut registry, 5);

        // At `end` voting is still open
        registry.close_expired(10, 4);
        assert_eq!(registry.get(early).unwrap().closing_total_shares, None);

        registry.close_expired(11, 4);
        assert_eq!(registry.get(early).unwrap().closing_total_shares, Some(4));
        assert_eq!(registry.get(late).unwrap().closing_total_shares, None);

        registry.close_expired(20, 2);
        assert_eq!(registry.get(early).unwrap().closing_total_shares, Some(4));
        assert_eq!(registry.get(late).unwrap().closing_total_shares, Some(2));
        assert_eq!(registry.get(early).unwrap().quorum_denominator(99), 4);
    }

    #[test]
    fn test_missing_proposal() {
        let registry = ProposalRegistry::new();
        assert_eq!(registry.get(7).unwrap_err(), DaoError::ProposalNotFound(7));
    }

    #[test]
    fn test_end_overflow() {
        let mut registry = ProposalRegistry::new();
        let result = registry.create(
            "x".to_string(),
            0,
            Address::from("p"),
            Address::from("a"),
            i64::MAX,
            1,
        );
        assert_eq!(result, Err(DaoError::Overflow));
        assert_eq!(registry.next_id(), 0);
    }
}
