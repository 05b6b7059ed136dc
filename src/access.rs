//! Access Policy
//!
//! Pure predicates over the current ledger state. Nothing here mutates.

use crate::error::{DaoError, DaoResult};
use crate::ledger::ContributionLedger;
use crate::types::Address;

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn is_admin(admin: &Address, caller: &Address) -> bool {
        admin == caller
    }

    pub fn is_investor(ledger: &ContributionLedger, caller: &Address) -> bool {
        ledger.is_investor(caller)
    }

    /// Fails with `NotAdmin` unless `caller` is the admin
    pub fn require_admin(admin: &Address, caller: &Address) -> DaoResult<()> {
        if Self::is_admin(admin, caller) {
            Ok(())
        } else {
            Err(DaoError::NotAdmin)
        }
    }

    /// Fails with `NotInvestor` unless `caller` has ever held shares
    pub fn require_investor(ledger: &ContributionLedger, caller: &Address) -> DaoResult<()> {
        if Self::is_investor(ledger, caller) {
            Ok(())
        } else {
            Err(DaoError::NotInvestor)
        }
    }
}
