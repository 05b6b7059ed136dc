//! Lock discipline for the shared ledger
//!
//! The ledger is the security-critical state of the DAO, so a poisoned ledger
//! lock fails closed: the operation is rejected with `DaoError::LockPoisoned`
//! instead of continuing on data a panicking thread may have half-written.
//! Auxiliary state (e.g. the in-memory bank) may recover instead.
//!
//! Value transfers run while the ledger lock is held. A transfer hook that calls
//! back into the ledger from the same thread is rejected by `ReentrancyGuard`
//! rather than deadlocking on the mutex.

use std::cell::Cell;
use std::sync::{Mutex, MutexGuard};
use tracing::error;

use crate::error::{DaoError, DaoResult};

thread_local! {
    static IN_LEDGER: Cell<bool> = const { Cell::new(false) };
}

// =============================================================================
// Mutex Acquisition
// =============================================================================

/// Acquire a Mutex lock, failing closed on poisoning.
///
/// # Arguments
/// * `mutex` - The Mutex to lock
/// * `context` - A description of what the lock protects (for logging)
pub fn lock_or_fail<'a, T>(mutex: &'a Mutex<T>, context: &str) -> DaoResult<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| {
        error!(
            "SECURITY: Mutex poisoned for '{}' - refusing to operate on possibly inconsistent state",
            context
        );
        DaoError::LockPoisoned
    })
}

/// Acquire a Mutex lock, recovering from poisoning if necessary.
///
/// Only for state that can tolerate being observed after a panic.
pub fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            error!(
                "SECURITY: Mutex poisoned for '{}' - recovering with potentially stale data",
                context
            );
            poisoned.into_inner()
        }
    }
}

// =============================================================================
// Re-entrancy Guard
// =============================================================================

/// Marks the current thread as inside the ledger's critical section.
///
/// Dropping the guard clears the mark.
#[derive(Debug)]
pub struct ReentrancyGuard {
    _private: (),
}

impl ReentrancyGuard {
    /// Enter the critical section, or fail if this thread is already inside it
    pub fn enter() -> DaoResult<Self> {
        IN_LEDGER.with(|flag| {
            if flag.get() {
                error!("SECURITY: re-entrant ledger call rejected");
                Err(DaoError::Reentrancy)
            } else {
                flag.set(true);
                Ok(Self { _private: () })
            }
        })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        IN_LEDGER.with(|flag| flag.set(false));
    }
}

// =============================================================================
// Tests
// =============================================================================
