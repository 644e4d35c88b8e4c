//! Player input lock.
//!
//! Autorun events and active cutscenes each hold one guard. Input stays
//! locked while at least one guard is alive.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

/// Reference-counted player input lock.
#[derive(Debug, Default)]
pub struct InputLock {
    holders: AtomicUsize,
}

impl InputLock {
    /// Creates an unlocked input lock.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Takes a hold on the lock. Input unlocks when every guard is dropped.
    #[must_use = "input unlocks as soon as the guard is dropped"]
    pub fn acquire(self: &Arc<Self>, holder: impl Into<String>) -> InputLockGuard {
        let holder = holder.into();
        if self.holders.fetch_add(1, Ordering::SeqCst) == 0 {
            debug!(%holder, "player input locked");
        }
        InputLockGuard {
            lock: Arc::clone(self),
            holder,
        }
    }

    /// Returns `true` while any guard is alive.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.holders() > 0
    }

    /// Number of live guards.
    #[must_use]
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::SeqCst)
    }
}

/// A live hold on the input lock.
#[derive(Debug)]
pub struct InputLockGuard {
    lock: Arc<InputLock>,
    holder: String,
}

impl Drop for InputLockGuard {
    fn drop(&mut self) {
        if self.lock.holders.fetch_sub(1, Ordering::SeqCst) == 1 {
            debug!(holder = %self.holder, "player input unlocked");
        }
    }
}
