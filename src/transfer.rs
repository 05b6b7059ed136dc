//! Outbound value transfers
//!
//! The ledger never moves value itself. Once an operation has committed its
//! bookkeeping it hands a `Payout` to a `ValueTransfer` implementation; a
//! failing transfer rolls the whole operation back.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use thiserror::Error;

use crate::lock_utils::lock_or_recover;
use crate::types::{Address, Amount};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("recipient {0} does not accept incoming value")]
    Rejected(Address),

    #[error("recipient {0} balance would overflow")]
    BalanceOverflow(Address),

    #[error("{0}")]
    Other(String),
}

/// Destination for value leaving the treasury
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

/// Serializable view of an `InMemoryBank`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    pub balances: BTreeMap<Address, Amount>,
    #[serde(default)]
    pub rejecting: BTreeSet<Address>,
}

/// Records value paid out to external addresses.
///
/// Addresses registered with `reject` refuse every incoming transfer, which
/// models a destination that cannot accept funds.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    state: Mutex<BankState>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: BankState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> BankState {
        lock_or_recover(&self.state, "bank").clone()
    }

    /// Total value received by `address`
    pub fn balance(&self, address: &Address) -> Amount {
        lock_or_recover(&self.state, "bank")
            .balances
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn reject(&self, address: &Address) {
        lock_or_recover(&self.state, "bank")
            .rejecting
            .insert(address.clone());
    }

    pub fn accept(&self, address: &Address) {
        lock_or_recover(&self.state, "bank")
            .rejecting
            .remove(address);
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let mut state = lock_or_recover(&self.state, "bank");
        if state.rejecting.contains(to) {
            return Err(TransferError::Rejected(to.clone()));
        }
        let balance = state.balances.entry(to.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::BalanceOverflow(to.clone()))?;
        Ok(())
    }
}
