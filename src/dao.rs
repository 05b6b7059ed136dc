//! Governance Treasury
//!
//! `DaoState` composes the ledger components into the DAO's operations.
//! `Dao` wraps one `DaoState` behind a single mutex and makes every operation
//! serializable and all-or-nothing:
//!
//! 1. enter the critical section (re-entry from a transfer hook is rejected)
//! 2. checkpoint the state and apply the operation to the live state
//! 3. if the operation produced a payout, hand it to the `ValueTransfer` hook
//! 4. on any error restore the checkpoint before the lock is released
//!
//! Bookkeeping is therefore always committed before value leaves the DAO, and
//! a failed transfer leaves no trace.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::access::AccessPolicy;
use crate::clock::Clock;
use crate::config::DaoSettings;
use crate::error::{DaoError, DaoResult};
use crate::events::DaoEvent;
use crate::execution::ExecutionGuard;
use crate::ledger::ContributionLedger;
use crate::lock_utils::{lock_or_fail, ReentrancyGuard};
use crate::proposals::{Proposal, ProposalRegistry, ProposalStatus};
use crate::transfer::ValueTransfer;
use crate::treasury::Treasury;
use crate::types::{Address, Amount, Payout, ProposalId, Timestamp};
use crate::voting::{meets_quorum, VotingEngine};

/// Maximum quorum percentage
pub const MAX_QUORUM_PERCENT: u8 = 100;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Fixed parameters of a DAO instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoConfig {
    /// Deployer; the only caller allowed to execute and withdraw
    pub admin: Address,
    /// Last second at which contributions are accepted
    pub contribution_end: Timestamp,
    /// Length of each proposal's voting window in seconds
    pub vote_time: u64,
    /// Minimum share of total voting weight (0-100) for execution
    pub quorum_percent: u8,
}

// ============================================================================
// LEDGER STATE
// ============================================================================

/// Complete ledger state of one DAO.
///
/// Operations check their preconditions before mutating, but only `Dao`
/// guarantees rollback (including on a failed value transfer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoState {
    config: DaoConfig,
    ledger: ContributionLedger,
    treasury: Treasury,
    proposals: ProposalRegistry,
    voting: VotingEngine,
    events: Vec<DaoEvent>,
}

impl DaoState {
    /// Deploy a new DAO with `deployer` as admin.
    ///
    /// Fails with `InvalidQuorum` unless the quorum is within 0-100.
    pub fn new(deployer: Address, settings: &DaoSettings, now: Timestamp) -> DaoResult<Self> {
        if settings.quorum_percent > MAX_QUORUM_PERCENT {
            return Err(DaoError::InvalidQuorum(settings.quorum_percent));
        }
        let contribution_end = i64::try_from(settings.contribution_duration_secs)
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or(DaoError::Overflow)?;

        let config = DaoConfig {
            admin: deployer,
            contribution_end,
            vote_time: settings.vote_duration_secs,
            quorum_percent: settings.quorum_percent,
        };

        info!(
            "DAO initialized: admin={}, contribution_end={}, vote_time={}s, quorum={}%",
            config.admin, config.contribution_end, config.vote_time, config.quorum_percent
        );

        let events = vec![DaoEvent::DaoInitialized {
            admin: config.admin.clone(),
            contribution_end,
            vote_time: config.vote_time,
            quorum_percent: config.quorum_percent,
            timestamp: now,
        }];

        Ok(Self {
            config,
            ledger: ContributionLedger::new(settings.burn_on_redeem),
            treasury: Treasury::new(),
            proposals: ProposalRegistry::new(),
            voting: VotingEngine::new(),
            events,
        })
    }

    /// Record the closing share supply of proposals whose window has passed
    fn settle(&mut self, now: Timestamp) {
        self.proposals.close_expired(now, self.ledger.total_shares());
    }

    // ------------------------------------------------------------------------
    // Contributions and shares
    // ------------------------------------------------------------------------

    /// Deposit `amount` during the contribution window for as many shares
    pub fn contribute(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> DaoResult<()> {
        self.settle(now);
        ContributionLedger::ensure_window_open(now, self.config.contribution_end)?;

        self.treasury.deposit(amount)?;
        self.ledger.mint(caller, amount)?;

        info!(
            "Contribution of {} by {} (total shares {})",
            amount,
            caller,
            self.ledger.total_shares()
        );
        self.events.push(DaoEvent::Contributed {
            investor: caller.clone(),
            amount,
            total_shares: self.ledger.total_shares(),
            timestamp: now,
        });
        Ok(())
    }

    /// Give back `amount` shares for the same amount of value
    pub fn redeem_share(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> DaoResult<Payout> {
        self.settle(now);
        self.ledger.ensure_shares(caller, amount)?;
        self.treasury.ensure_available(amount)?;

        self.ledger.redeem(caller, amount)?;
        self.treasury.spend(amount)?;

        info!("{} redeemed {} shares", caller, amount);
        self.events.push(DaoEvent::SharesRedeemed {
            investor: caller.clone(),
            amount,
            timestamp: now,
        });
        Ok(Payout {
            to: caller.clone(),
            amount,
        })
    }

    /// Reassign `amount` shares from `caller` to `to`
    pub fn transfer_share(
        &mut self,
        caller: &Address,
        amount: Amount,
        to: &Address,
        now: Timestamp,
    ) -> DaoResult<()> {
        self.settle(now);
        self.ledger.transfer(caller, amount, to)?;

        info!("{} transferred {} shares to {}", caller, amount, to);
        self.events.push(DaoEvent::SharesTransferred {
            from: caller.clone(),
            to: to.clone(),
            amount,
            timestamp: now,
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Proposals and votes
    // ------------------------------------------------------------------------

    /// Create a proposal and reserve its amount from the available funds
    pub fn create_proposal(
        &mut self,
        caller: &Address,
        name: String,
        amount: Amount,
        recipient: &Address,
        now: Timestamp,
    ) -> DaoResult<ProposalId> {
        self.settle(now);
        AccessPolicy::require_investor(&self.ledger, caller)?;
        self.treasury.reserve(amount)?;

        let id = self.proposals.create(
            name.clone(),
            amount,
            recipient.clone(),
            caller.clone(),
            now,
            self.config.vote_time,
        )?;

        let end = self.proposals.get(id)?.end;
        info!(
            "Proposal {} created: '{}' by {} ({} to {}, voting until {})",
            id, name, caller, amount, recipient, end
        );
        self.events.push(DaoEvent::ProposalCreated {
            proposal_id: id,
            proposer: caller.clone(),
            name,
            amount,
            recipient: recipient.clone(),
            end,
            timestamp: now,
        });
        Ok(id)
    }

    /// Vote for a proposal with the caller's current share balance.
    ///
    /// Returns the weight that was added.
    pub fn vote(&mut self, caller: &Address, proposal_id: ProposalId, now: Timestamp) -> DaoResult<Amount> {
        self.settle(now);
        AccessPolicy::require_investor(&self.ledger, caller)?;

        let weight = self.ledger.shares(caller);
        let proposal = self.proposals.get_mut(proposal_id)?;
        self.voting.cast(proposal, caller, weight, now)?;
        let total_votes = proposal.votes;

        info!(
            "Vote cast on proposal {} with weight {} by {} (total {})",
            proposal_id, weight, caller, total_votes
        );
        self.events.push(DaoEvent::VoteCast {
            proposal_id,
            voter: caller.clone(),
            weight,
            total_votes,
            timestamp: now,
        });
        Ok(weight)
    }

    /// Mark a passed proposal executed; the payout goes to its recipient
    pub fn execute_proposal(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        now: Timestamp,
    ) -> DaoResult<Payout> {
        self.settle(now);
        let payout = ExecutionGuard::execute(
            &self.config,
            &self.ledger,
            &mut self.proposals,
            &mut self.treasury,
            caller,
            proposal_id,
            now,
        )?;

        info!(
            "Proposal {} executed: {} transferred to {}",
            proposal_id, payout.amount, payout.to
        );
        self.events.push(DaoEvent::ProposalExecuted {
            proposal_id,
            recipient: payout.to.clone(),
            amount: payout.amount,
            timestamp: now,
        });
        Ok(payout)
    }

    /// Admin withdrawal of unreserved funds
    pub fn withdraw_ether(
        &mut self,
        caller: &Address,
        amount: Amount,
        to: &Address,
        now: Timestamp,
    ) -> DaoResult<Payout> {
        self.settle(now);
        let payout = ExecutionGuard::withdraw(&self.config, &mut self.treasury, caller, amount, to)?;

        info!("Admin withdrew {} to {}", amount, to);
        self.events.push(DaoEvent::FundsWithdrawn {
            to: to.clone(),
            amount,
            timestamp: now,
        });
        Ok(payout)
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    pub fn admin(&self) -> &Address {
        &self.config.admin
    }

    pub fn contribution_end(&self) -> Timestamp {
        self.config.contribution_end
    }

    pub fn vote_time(&self) -> u64 {
        self.config.vote_time
    }

    pub fn quorum_percent(&self) -> u8 {
        self.config.quorum_percent
    }

    pub fn ledger(&self) -> &ContributionLedger {
        &self.ledger
    }

    pub fn total_shares(&self) -> Amount {
        self.ledger.total_shares()
    }

    pub fn shares(&self, address: &Address) -> Amount {
        self.ledger.shares(address)
    }

    pub fn is_investor(&self, address: &Address) -> bool {
        self.ledger.is_investor(address)
    }

    pub fn available_funds(&self) -> Amount {
        self.treasury.available_funds()
    }

    pub fn held_balance(&self) -> Amount {
        self.treasury.held_balance()
    }

    /// Value reserved by proposals that have not been executed
    pub fn reserved_funds(&self) -> Amount {
        self.treasury.reserved()
    }

    pub fn next_proposal_id(&self) -> ProposalId {
        self.proposals.next_id()
    }

    pub fn proposal(&self, id: ProposalId) -> DaoResult<&Proposal> {
        self.proposals.get(id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    pub fn has_voted(&self, id: ProposalId, voter: &Address) -> bool {
        self.voting.has_voted(id, voter)
    }

    /// Lifecycle position of a proposal at `now`
    pub fn proposal_status(&self, id: ProposalId, now: Timestamp) -> DaoResult<ProposalStatus> {
        let proposal = self.proposals.get(id)?;
        let status = if proposal.executed {
            ProposalStatus::Executed
        } else if proposal.is_open(now) {
            ProposalStatus::Open
        } else if meets_quorum(
            proposal.votes,
            proposal.quorum_denominator(self.ledger.total_shares()),
            self.config.quorum_percent,
        ) {
            ProposalStatus::Executable
        } else {
            ProposalStatus::Unexecutable
        };
        Ok(status)
    }

    pub fn events(&self) -> &[DaoEvent] {
        &self.events
    }

    /// Copy everything except the append-only event log
    fn checkpoint(&mut self) -> Checkpoint {
        let events = std::mem::take(&mut self.events);
        let state = self.clone();
        self.events = events;
        Checkpoint {
            event_count: self.events.len(),
            state,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        let mut events = std::mem::take(&mut self.events);
        events.truncate(checkpoint.event_count);
        *self = checkpoint.state;
        self.events = events;
    }
}

/// Pre-operation state for rollback; holds no events
struct Checkpoint {
    state: DaoState,
    event_count: usize,
}

// ============================================================================
// SERIALIZED HANDLE
// ============================================================================

/// Thread-safe DAO: one ledger, one lock, all-or-nothing operations
pub struct Dao {
    state: Mutex<DaoState>,
    clock: Arc<dyn Clock>,
    bank: Arc<dyn ValueTransfer>,
}

impl Dao {
    /// Deploy a new DAO with `deployer` as admin
    pub fn new(
        deployer: Address,
        settings: &DaoSettings,
        clock: Arc<dyn Clock>,
        bank: Arc<dyn ValueTransfer>,
    ) -> DaoResult<Self> {
        let state = DaoState::new(deployer, settings, clock.now())?;
        Ok(Self::from_state(state, clock, bank))
    }

    /// Resume a DAO from previously persisted state
    pub fn from_state(state: DaoState, clock: Arc<dyn Clock>, bank: Arc<dyn ValueTransfer>) -> Self {
        Self {
            state: Mutex::new(state),
            clock,
            bank,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn transact<T>(
        &self,
        operation: &str,
        apply: impl FnOnce(&mut DaoState, Timestamp) -> DaoResult<(T, Option<Payout>)>,
    ) -> DaoResult<T> {
        let _entered = ReentrancyGuard::enter()?;
        let mut state = lock_or_fail(&self.state, "dao ledger")?;
        let now = self.clock.now();
        let checkpoint = state.checkpoint();

        let result = apply(&mut *state, now).and_then(|(value, payout)| {
            if let Some(payout) = payout {
                debug!("{}: paying {} to {}", operation, payout.amount, payout.to);
                self.bank
                    .transfer(&payout.to, payout.amount)
                    .map_err(|e| DaoError::TransferFailed {
                        to: payout.to.clone(),
                        amount: payout.amount,
                        reason: e.to_string(),
                    })?;
            }
            Ok(value)
        });

        if let Err(err) = &result {
            state.restore(checkpoint);
            warn!("{} rejected: {} ({})", operation, err, err.category());
        }
        result
    }

    /// Run `view` against a consistent state
    pub fn read<T>(&self, view: impl FnOnce(&DaoState) -> T) -> DaoResult<T> {
        let _entered = ReentrancyGuard::enter()?;
        let state = lock_or_fail(&self.state, "dao ledger")?;
        Ok(view(&*state))
    }

    /// Copy of the full ledger state
    pub fn snapshot(&self) -> DaoResult<DaoState> {
        self.read(DaoState::clone)
    }

    pub fn contribute(&self, caller: &Address, amount: Amount) -> DaoResult<()> {
        self.transact("contribute", |state, now| {
            state.contribute(caller, amount, now).map(|()| ((), None))
        })
    }

    pub fn redeem_share(&self, caller: &Address, amount: Amount) -> DaoResult<()> {
        self.transact("redeem_share", |state, now| {
            state
                .redeem_share(caller, amount, now)
                .map(|payout| ((), Some(payout)))
        })
    }

    pub fn transfer_share(&self, caller: &Address, amount: Amount, to: &Address) -> DaoResult<()> {
        self.transact("transfer_share", |state, now| {
            state.transfer_share(caller, amount, to, now).map(|()| ((), None))
        })
    }

    pub fn create_proposal(
        &self,
        caller: &Address,
        name: impl Into<String>,
        amount: Amount,
        recipient: &Address,
    ) -> DaoResult<ProposalId> {
        let name = name.into();
        self.transact("create_proposal", |state, now| {
            state
                .create_proposal(caller, name, amount, recipient, now)
                .map(|id| (id, None))
        })
    }

    pub fn vote(&self, caller: &Address, proposal_id: ProposalId) -> DaoResult<Amount> {
        self.transact("vote", |state, now| {
            state.vote(caller, proposal_id, now).map(|weight| (weight, None))
        })
    }

    pub fn execute_proposal(&self, caller: &Address, proposal_id: ProposalId) -> DaoResult<()> {
        self.transact("execute_proposal", |state, now| {
            state
                .execute_proposal(caller, proposal_id, now)
                .map(|payout| ((), Some(payout)))
        })
    }

    pub fn withdraw_ether(&self, caller: &Address, amount: Amount, to: &Address) -> DaoResult<()> {
        self.transact("withdraw_ether", |state, now| {
            state
                .withdraw_ether(caller, amount, to, now)
                .map(|payout| ((), Some(payout)))
        })
    }

    pub fn admin(&self) -> DaoResult<Address> {
        self.read(|s| s.admin().clone())
    }

    pub fn contribution_end(&self) -> DaoResult<Timestamp> {
        self.read(DaoState::contribution_end)
    }

    pub fn vote_time(&self) -> DaoResult<u64> {
        self.read(DaoState::vote_time)
    }

    pub fn quorum_percent(&self) -> DaoResult<u8> {
        self.read(DaoState::quorum_percent)
    }

    pub fn total_shares(&self) -> DaoResult<Amount> {
        self.read(DaoState::total_shares)
    }

    pub fn available_funds(&self) -> DaoResult<Amount> {
        self.read(DaoState::available_funds)
    }

    pub fn shares(&self, address: &Address) -> DaoResult<Amount> {
        self.read(|s| s.shares(address))
    }

    pub fn is_investor(&self, address: &Address) -> DaoResult<bool> {
        self.read(|s| s.is_investor(address))
    }

    pub fn proposal(&self, id: ProposalId) -> DaoResult<Proposal> {
        self.read(|s| s.proposal(id).cloned())?
    }

    pub fn next_proposal_id(&self) -> DaoResult<ProposalId> {
        self.read(DaoState::next_proposal_id)
    }

    pub fn proposal_status(&self, id: ProposalId) -> DaoResult<ProposalStatus> {
        let now = self.clock.now();
        self.read(|s| s.proposal_status(id, now))?
    }
}
