use crate::Result;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A cooperative cancellation signal shared by every parse task.
///
/// Parsers check the signal before and after each document. Tasks parked in
/// [`Cancellation::cancelled`] are woken as soon as [`Cancellation::cancel`] is called.
#[derive(Debug, Default)]
pub struct Cancellation {
    cancelled: AtomicBool,
    notify: Notify,
}

impl Cancellation {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with a cancellation error if the signal has been raised.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ohno::app_err!("operation cancelled"));
        }
        Ok(())
    }

    /// Wait until the signal is raised.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);

        // Register interest before checking the flag so a concurrent cancel is never missed
        let _ = notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }

        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[test]
    fn test_check_after_cancel() {
        let cancel = Cancellation::new();
        cancel.check().unwrap();

        cancel.cancel();
        assert!(cancel.is_cancelled());
        let _ = cancel.check().unwrap_err();
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_cancelled_wakes_waiters() {
        let cancel = Cancellation::new();
        let waiter = {
            let cancel = Arc::clone(&cancel);
            tokio::spawn(async move { cancel.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let cancel = Cancellation::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled()).await.unwrap();
    }
}
