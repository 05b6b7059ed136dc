//! Voting Engine
//!
//! One vote per investor per proposal, weighted by the voter's share balance
//! at the moment the vote is cast. Weight is not snapshotted at proposal
//! creation, so shares received by transfer after a proposal was created still
//! count for a later vote.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{DaoError, DaoResult};
use crate::proposals::Proposal;
use crate::types::{Address, Amount, ProposalId, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingEngine {
    records: BTreeSet<(ProposalId, Address)>,
}

impl VotingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, proposal_id: ProposalId, voter: &Address) -> bool {
        self.records.contains(&(proposal_id, voter.clone()))
    }

    /// Number of recorded votes across all proposals
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add `weight` to `proposal` on behalf of `voter`.
    ///
    /// Checks, in order: `AlreadyVoted`, then `VotingClosed`.
    pub fn cast(
        &mut self,
        proposal: &mut Proposal,
        voter: &Address,
        weight: Amount,
        now: Timestamp,
    ) -> DaoResult<()> {
        if self.has_voted(proposal.id, voter) {
            return Err(DaoError::AlreadyVoted {
                proposal_id: proposal.id,
                voter: voter.clone(),
            });
        }
        if !proposal.is_open(now) {
            return Err(DaoError::VotingClosed {
                proposal_id: proposal.id,
                end: proposal.end,
                now,
            });
        }
        let votes = proposal
            .votes
            .checked_add(weight)
            .ok_or(DaoError::Overflow)?;

        self.records.insert((proposal.id, voter.clone()));
        proposal.votes = votes;
        Ok(())
    }
}

/// Percentage of `total_shares` represented by `votes`, rounded down.
///
/// Zero total supply counts as 0%.
pub fn vote_percentage(votes: Amount, total_shares: Amount) -> u64 {
    if total_shares == 0 {
        return 0;
    }
    let percent = u128::from(votes) * 100 / u128::from(total_shares);
    u64::try_from(percent).unwrap_or(u64::MAX)
}

pub fn meets_quorum(votes: Amount, total_shares: Amount, quorum_percent: u8) -> bool {
    vote_percentage(votes, total_shares) >= u64::from(quorum_percent)
}
