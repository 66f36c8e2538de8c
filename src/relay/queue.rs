use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::core::error::{AppError, AppResult};
use crate::core::metrics;

/// Bounds the number of relays (extraction + sending) running at once.
///
/// Waiting is unbounded: callers queue up on the semaphore instead of being
/// rejected.
#[derive(Clone)]
pub struct RelayQueue {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held queue slot. The slot is released when this value is dropped.
pub struct RelaySlot {
    _permit: OwnedSemaphorePermit,
}

impl Drop for RelaySlot {
    fn drop(&mut self) {
        metrics::RELAYS_IN_FLIGHT.dec();
    }
}

impl RelayQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> AppResult<RelaySlot> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AppError::QueueClosed)?;
        metrics::RELAYS_IN_FLIGHT.inc();
        log::debug!(
            "Relay slot acquired (permits available: {})",
            self.semaphore.available_permits()
        );
        Ok(RelaySlot { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}
