use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Value and share amounts (1 unit contributed = 1 share)
pub type Amount = u64;

/// Sequential proposal identifier, starting at 0
pub type ProposalId = u64;

/// Opaque caller / recipient identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Per-address ledger entry
///
/// Created on first contribution or first incoming share transfer and never
/// removed; an investor whose shares drop to zero stays an investor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub is_investor: bool,
    pub shares: Amount,
}

/// Value leaving the treasury once the ledger has committed its bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub to: Address,
    pub amount: Amount,
}
