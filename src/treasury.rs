//! Treasury
//!
//! Tracks two numbers:
//! - `held_balance`: value physically held by the DAO
//! - `available_funds`: held value not yet reserved by a proposal or withdrawn
//!
//! A proposal reserves its amount at creation (available drops, held does not)
//! and only the execution moves the value out (held drops). So for every
//! reachable state `held_balance == available_funds + reserved`.

use serde::{Deserialize, Serialize};

use crate::error::{DaoError, DaoResult};
use crate::types::Amount;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    available_funds: Amount,
    held_balance: Amount,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn available_funds(&self) -> Amount {
        self.available_funds
    }

    pub fn held_balance(&self) -> Amount {
        self.held_balance
    }

    /// Value held on behalf of proposals that have not been executed yet
    pub fn reserved(&self) -> Amount {
        self.held_balance - self.available_funds
    }

    /// Incoming value, immediately spendable
    pub fn deposit(&mut self, amount: Amount) -> DaoResult<()> {
        let available = self
            .available_funds
            .checked_add(amount)
            .ok_or(DaoError::Overflow)?;
        let held = self
            .held_balance
            .checked_add(amount)
            .ok_or(DaoError::Overflow)?;
        self.available_funds = available;
        self.held_balance = held;
        Ok(())
    }

    /// Fails with `InsufficientFunds` unless `amount` is available
    pub fn ensure_available(&self, amount: Amount) -> DaoResult<()> {
        if self.available_funds < amount {
            return Err(DaoError::InsufficientFunds {
                need: amount,
                available: self.available_funds,
            });
        }
        Ok(())
    }

    /// Earmark `amount` for a proposal. The value stays held.
    pub fn reserve(&mut self, amount: Amount) -> DaoResult<()> {
        if amount > self.available_funds {
            return Err(DaoError::AmountExceedsFunds {
                amount,
                available: self.available_funds,
            });
        }
        self.available_funds -= amount;
        Ok(())
    }

    /// Spend unreserved value (redemptions, admin withdrawals)
    pub fn spend(&mut self, amount: Amount) -> DaoResult<()> {
        self.ensure_available(amount)?;
        self.available_funds -= amount;
        self.held_balance -= amount;
        Ok(())
    }

    /// Release value previously reserved by a proposal
    pub fn disburse_reserved(&mut self, amount: Amount) -> DaoResult<()> {
        if amount > self.reserved() {
            return Err(DaoError::Overflow);
        }
        self.held_balance -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit() {
        let mut treasury = Treasury::new();
        treasury.deposit(5).unwrap();
        assert_eq!(treasury.available_funds(), 5);
        assert_eq!(treasury.held_balance(), 5);
        assert_eq!(treasury.reserved(), 0);
    }

    #[test]
    fn test_reserve_diverges_available_from_held() {
        let mut treasury = Treasury::new();
        treasury.deposit(2).unwrap();
        treasury.reserve(1).unwrap();

        assert_eq!(treasury.available_funds(), 1);
        assert_eq!(treasury.held_balance(), 2);
        assert_eq!(treasury.reserved(), 1);
    }

    #[test]
    fn test_reserve_more_than_available() {
        let mut treasury = Treasury::new();
        treasury.deposit(1).unwrap();
        assert_eq!(
            treasury.reserve(2),
            Err(DaoError::AmountExceedsFunds {
                amount: 2,
                available: 1
            })
        );
        assert_eq!(treasury.available_funds(), 1);
    }

    #[test]
    fn test_spend() {
        let mut treasury = Treasury::new();
        treasury.deposit(10).unwrap();
        treasury.spend(4).unwrap();
        assert_eq!(treasury.available_funds(), 6);
        assert_eq!(treasury.held_balance(), 6);
    }

    #[test]
    fn test_spend_cannot_touch_reserved_value() {
        let mut treasury = Treasury::new();
        treasury.deposit(2).unwrap();
        treasury.reserve(2).unwrap();
        assert_eq!(
            treasury.spend(1),
            Err(DaoError::InsufficientFunds {
                need: 1,
                available: 0
            })
        );
        assert_eq!(treasury.held_balance(), 2);
    }

    #[test]
    fn test_disburse_reserved() {
        let mut treasury = Treasury::new();
        treasury.deposit(3).unwrap();
        treasury.reserve(1).unwrap();
        treasury.disburse_reserved(1).unwrap();

        assert_eq!(treasury.available_funds(), 2);
        assert_eq!(treasury.held_balance(), 2);
        assert_eq!(treasury.reserved(), 0);
    }
}
