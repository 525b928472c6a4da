//! Binary, non-reentrant, cancellable advisory lock.
//!
//! The lock is a single slot that moves between two counting semaphores:
//! `vacant` holds the slot while nobody owns the lock, `held` holds it while
//! somebody does. Acquire moves the slot from `vacant` to `held`, release
//! moves it back. Each move waits on the source semaphore and races the
//! caller's [`Cancellation`]; the move itself never suspends, so a cancelled
//! wait leaves the slot exactly where it was.
//!
//! Release is not ownership-checked. Releasing a free lock waits until some
//! other caller acquires it.

use tokio::sync::{Semaphore, TryAcquireError};

use crate::cancel::Cancellation;
use crate::error::LockError;

/// Per-key advisory mutex.
#[derive(Debug)]
pub struct AdvisoryLock {
    vacant: Semaphore,
    held: Semaphore,
}

impl AdvisoryLock {
    /// Create a free lock.
    pub fn new() -> Self {
        Self {
            vacant: Semaphore::new(1),
            held: Semaphore::new(0),
        }
    }

    /// Wait until the lock is free and take it.
    ///
    /// A signal that has already fired wins even if the lock is free.
    pub async fn acquire(&self, cancel: &Cancellation) -> Result<(), LockError> {
        move_slot(&self.vacant, &self.held, cancel).await
    }

    /// Wait until the lock is held and clear it.
    pub async fn release(&self, cancel: &Cancellation) -> Result<(), LockError> {
        move_slot(&self.held, &self.vacant, cancel).await
    }

    /// Take the lock if it is free right now.
    pub fn try_acquire(&self) -> Result<bool, LockError> {
        match self.vacant.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.held.add_permits(1);
                Ok(true)
            }
            Err(TryAcquireError::NoPermits) => Ok(false),
            Err(TryAcquireError::Closed) => Err(LockError::Closed),
        }
    }

    /// Returns `true` while some caller holds the lock.
    pub fn is_held(&self) -> bool {
        self.held.available_permits() > 0
    }

    /// Close the lock. Pending and future waits fail with [`LockError::Closed`].
    pub fn close(&self) {
        self.vacant.close();
        self.held.close();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.vacant.is_closed()
    }
}

impl Default for AdvisoryLock {
    fn default() -> Self {
        Self::new()
    }
}

async fn move_slot(
    from: &Semaphore,
    to: &Semaphore,
    cancel: &Cancellation,
) -> Result<(), LockError> {
    tokio::select! {
        biased;
        reason = cancel.cancelled() => Err(LockError::Cancelled(reason)),
        permit = from.acquire() => {
            permit.map_err(|_| LockError::Closed)?.forget();
            to.add_permits(1);
            Ok(())
        }
    }
}
