use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::AppError;

/// Process-wide cap on simultaneously open sessions.
///
/// Built once at start-up and cloned into everything that opens sessions;
/// all clones share the same permits. Callers beyond the cap wait in FIFO
/// order instead of creating more sessions.
#[derive(Debug, Clone)]
pub struct SessionLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct SessionPermit {
    _permit: OwnedSemaphorePermit,
}

impl SessionLimiter {
    /// A limiter with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot. Fails only once the limiter is closed.
    pub async fn acquire(&self) -> Result<SessionPermit, AppError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AppError::LimiterClosed)?;
        Ok(SessionPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Stop handing out slots. Current waiters and later callers get
    /// [`AppError::LimiterClosed`]; held permits stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}
