//! Execution Guard
//!
//! Admin-only release of treasury value: proposal execution after the voting
//! window and direct withdrawals. Every check runs before the first mutation;
//! the returned `Payout` is handed to the value-transfer hook only after the
//! ledger has recorded the spend.

use crate::access::AccessPolicy;
use crate::dao::DaoConfig;
use crate::error::{DaoError, DaoResult};
use crate::ledger::ContributionLedger;
use crate::proposals::ProposalRegistry;
use crate::treasury::Treasury;
use crate::types::{Address, Amount, Payout, ProposalId, Timestamp};
use crate::voting::vote_percentage;

pub struct ExecutionGuard;

impl ExecutionGuard {
    /// Execute a closed proposal that met quorum.
    ///
    /// Checks, in order: `NotAdmin`, `ProposalNotFound`, `VotingStillOpen`,
    /// `AlreadyExecuted`, `QuorumNotMet`.
    pub fn execute(
        config: &DaoConfig,
        ledger: &ContributionLedger,
        registry: &mut ProposalRegistry,
        treasury: &mut Treasury,
        caller: &Address,
        proposal_id: ProposalId,
        now: Timestamp,
    ) -> DaoResult<Payout> {
        AccessPolicy::require_admin(&config.admin, caller)?;

        let proposal = registry.get(proposal_id)?;
        if proposal.is_open(now) {
            return Err(DaoError::VotingStillOpen {
                proposal_id,
                end: proposal.end,
                now,
            });
        }
        if proposal.executed {
            return Err(DaoError::AlreadyExecuted(proposal_id));
        }

        let percent = vote_percentage(
            proposal.votes,
            proposal.quorum_denominator(ledger.total_shares()),
        );
        if percent < u64::from(config.quorum_percent) {
            return Err(DaoError::QuorumNotMet {
                proposal_id,
                percent,
                quorum: config.quorum_percent,
            });
        }

        let payout = Payout {
            to: proposal.recipient.clone(),
            amount: proposal.amount,
        };
        treasury.disburse_reserved(payout.amount)?;
        registry.get_mut(proposal_id)?.executed = true;

        Ok(payout)
    }

    /// Admin withdrawal of unreserved funds to `to`.
    pub fn withdraw(
        config: &DaoConfig,
        treasury: &mut Treasury,
        caller: &Address,
        amount: Amount,
        to: &Address,
    ) -> DaoResult<Payout> {
        AccessPolicy::require_admin(&config.admin, caller)?;
        treasury.spend(amount)?;

        Ok(Payout {
            to: to.clone(),
            amount,
        })
    }
}
