//! # Coin Stores
//!
//! A [`CoinStore`] is one account's holding of one coin type: a `u64`
//! balance in base units plus a frozen flag. The ledger keeps one store per
//! (account, coin type) pair, created by registration.
//!
//! Stores enforce the arithmetic invariants (no overdraft, no overflow).
//! The frozen flag is only recorded here; whether an operation honors it is
//! the ledger's decision, since burns ignore it and transfers do not.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arithmetic failures on a single store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// Attempted to debit more than the available balance.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A credit would exceed `u64::MAX`.
    #[error("balance overflow: current {current}, credit {credit}")]
    Overflow {
        /// The balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

/// One account's holding of one coin type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinStore {
    /// Balance in base units.
    pub balance: u64,
    /// Whether the holding is frozen.
    pub frozen: bool,
}

impl CoinStore {
    /// Creates an empty, unfrozen store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount`, returning the new balance.
    pub fn credit(&mut self, amount: u64) -> Result<u64, BalanceError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(BalanceError::Overflow {
                current: self.balance,
                credit: amount,
            })?;
        Ok(self.balance)
    }

    /// Subtracts `amount`, returning the new balance.
    pub fn debit(&mut self, amount: u64) -> Result<u64, BalanceError> {
        if self.balance < amount {
            return Err(BalanceError::InsufficientBalance {
                available: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_accumulates() {
        let mut store = CoinStore::new();
        store.credit(500).unwrap();
        assert_eq!(store.credit(300).unwrap(), 800);
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut store = CoinStore::new();
        store.credit(u64::MAX).unwrap();
        assert!(matches!(
            store.credit(1),
            Err(BalanceError::Overflow { .. })
        ));
        assert_eq!(store.balance, u64::MAX);
    }

    #[test]
    fn debit_to_zero() {
        let mut store = CoinStore::new();
        store.credit(500).unwrap();
        assert_eq!(store.debit(500).unwrap(), 0);
        assert_eq!(store.balance, 0);
    }

    #[test]
    fn debit_insufficient_balance_rejected() {
        let mut store = CoinStore::new();
        store.credit(100).unwrap();
        assert_eq!(
            store.debit(200),
            Err(BalanceError::InsufficientBalance {
                available: 100,
                requested: 200,
            })
        );
        assert_eq!(store.balance, 100);
    }

    #[test]
    fn frozen_flag_does_not_block_arithmetic() {
        let mut store = CoinStore {
            balance: 10,
            frozen: true,
        };
        assert_eq!(store.debit(4).unwrap(), 6);
    }
}
