//! # Shared Ledger Handle
//!
//! A cloneable `Arc<RwLock<L>>` wrapper for hosts that drive the ledger from
//! several threads. Each [`SharedLedger::transact`] call holds the write lock
//! for its whole duration and runs inside [`Ledger::atomic`], so concurrent
//! operations are serialized and each is all-or-nothing.

use parking_lot::RwLock;
use std::sync::Arc;

use super::Ledger;

/// Thread-safe handle over any [`Ledger`].
pub struct SharedLedger<L> {
    inner: Arc<RwLock<L>>,
}

impl<L> Clone for SharedLedger<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Ledger> SharedLedger<L> {
    /// Wraps `ledger`.
    pub fn new(ledger: L) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Runs `f` under the write lock as one atomic operation.
    pub fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut L) -> Result<T, E>,
    {
        let mut guard = self.inner.write();
        guard.atomic(f)
    }

    /// Runs `f` under the read lock.
    pub fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&L) -> T,
    {
        let guard = self.inner.read();
        f(&guard)
    }
}
