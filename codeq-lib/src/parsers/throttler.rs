use super::Cancellation;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limits how many documents are parsed at the same time.
///
/// Wrap in an `Arc` via [`Throttler::new`], then call [`Throttler::acquire`] before
/// each document. At most `max_concurrent` parses run simultaneously. Tasks
/// still waiting for a slot give up as soon as the run is cancelled.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
}

impl Throttler {
    /// Create a new throttler that allows at most `max_concurrent` tasks at a time.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    /// Wait for a concurrency slot.
    ///
    /// Returns `None` if `cancel` is raised before a slot becomes available.
    /// The returned permit must be held for the duration of the work.
    pub async fn acquire(&self, cancel: &Cancellation) -> Option<OwnedSemaphorePermit> {
        if cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                Some(permit.expect("semaphore is never closed"))
            }
            () = cancel.cancelled() => None,
        }
    }
}
