use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::CoreError;

/// Process-wide guard of "is any task currently running".
///
/// Cloning shares the same underlying permit, so every handler sees one lock.
#[derive(Clone, Debug)]
pub struct ExecutionLock {
    permits: Arc<Semaphore>,
}

impl ExecutionLock {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Atomically take the lock if it is free.
    ///
    /// This is the only acquisition path used by the trigger gate, so two concurrent
    /// triggers can never both pass the busy check.
    pub fn try_acquire(&self) -> Result<ExecutionGuard, CoreError> {
        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| CoreError::TaskBusy)?;
        debug!(target: "sdci.core.lock", "lock acquired");
        Ok(ExecutionGuard { _permit: permit })
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for ExecutionLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of holding the [`ExecutionLock`]; released on drop.
#[derive(Debug)]
pub struct ExecutionGuard {
    _permit: OwnedSemaphorePermit,
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        debug!(target: "sdci.core.lock", "lock released");
    }
}
