//! Contribution Ledger
//!
//! Per-address share balances and the aggregate share supply.
//!
//! Shares are minted 1:1 with contributed value. Redemption lowers the
//! redeeming account's balance; whether it also lowers `total_shares` is
//! governed by `burn_on_redeem`. When burning is off the redeemed weight is
//! tracked in `redeemed_shares`, so that
//! `total_shares == sum(shares) + redeemed_shares` always holds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DaoError, DaoResult};
use crate::types::{Account, Address, Amount, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLedger {
    accounts: BTreeMap<Address, Account>,
    total_shares: Amount,
    redeemed_shares: Amount,
    burn_on_redeem: bool,
}

impl ContributionLedger {
    pub fn new(burn_on_redeem: bool) -> Self {
        Self {
            burn_on_redeem,
            ..Self::default()
        }
    }

    /// Contributions are accepted up to and including `contribution_end`
    pub fn ensure_window_open(now: Timestamp, contribution_end: Timestamp) -> DaoResult<()> {
        if now > contribution_end {
            return Err(DaoError::ContributionWindowClosed {
                contribution_end,
                now,
            });
        }
        Ok(())
    }

    pub fn shares(&self, address: &Address) -> Amount {
        self.accounts.get(address).map_or(0, |a| a.shares)
    }

    pub fn is_investor(&self, address: &Address) -> bool {
        self.accounts.get(address).is_some_and(|a| a.is_investor)
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    pub fn redeemed_shares(&self) -> Amount {
        self.redeemed_shares
    }

    pub fn burn_on_redeem(&self) -> bool {
        self.burn_on_redeem
    }

    /// Fails with `InsufficientShares` unless `address` holds at least `amount`
    pub fn ensure_shares(&self, address: &Address, amount: Amount) -> DaoResult<()> {
        let have = self.shares(address);
        if have < amount {
            return Err(DaoError::InsufficientShares { need: amount, have });
        }
        Ok(())
    }

    /// Mint `amount` shares to `address` and mark it as an investor
    pub fn mint(&mut self, address: &Address, amount: Amount) -> DaoResult<()> {
        let balance = self
            .shares(address)
            .checked_add(amount)
            .ok_or(DaoError::Overflow)?;
        let total = self
            .total_shares
            .checked_add(amount)
            .ok_or(DaoError::Overflow)?;

        let account = self.accounts.entry(address.clone()).or_default();
        account.is_investor = true;
        account.shares = balance;
        self.total_shares = total;
        Ok(())
    }

    /// Remove `amount` shares from `address` in exchange for value
    pub fn redeem(&mut self, address: &Address, amount: Amount) -> DaoResult<()> {
        self.ensure_shares(address, amount)?;

        if self.burn_on_redeem {
            self.total_shares = self
                .total_shares
                .checked_sub(amount)
                .ok_or(DaoError::Overflow)?;
        } else {
            self.redeemed_shares = self
                .redeemed_shares
                .checked_add(amount)
                .ok_or(DaoError::Overflow)?;
        }

        if let Some(account) = self.accounts.get_mut(address) {
            account.shares -= amount;
        }
        Ok(())
    }

    /// Move `amount` shares from `from` to `to`; `to` becomes an investor
    pub fn transfer(&mut self, from: &Address, amount: Amount, to: &Address) -> DaoResult<()> {
        self.ensure_shares(from, amount)?;

        if from != to {
            let credited = self
                .shares(to)
                .checked_add(amount)
                .ok_or(DaoError::Overflow)?;
            if let Some(account) = self.accounts.get_mut(from) {
                account.shares -= amount;
            }
            self.accounts.entry(to.clone()).or_default().shares = credited;
        }

        self.accounts.entry(to.clone()).or_default().is_investor = true;
        Ok(())
    }
}
