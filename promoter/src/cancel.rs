//! Cooperative cancellation for promotion and health-check runs.
//!
//! The engines poll [`Cancellation::cause`] between steps; runners receive the
//! same handle and are expected to honor it during their own work, either by
//! polling or by awaiting [`Cancellation::cancelled`]. Nothing here pre-empts a
//! running future.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Why a run was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelCause {
    /// Caller-initiated cancellation.
    Canceled,
    /// A deadline elapsed.
    DeadlineExceeded,
    Other(String),
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::Canceled => f.write_str("context canceled"),
            CancelCause::DeadlineExceeded => f.write_str("context deadline exceeded"),
            CancelCause::Other(reason) => f.write_str(reason),
        }
    }
}

/// Cloneable cancellation handle. All clones observe the same signal; the
/// first recorded cause wins.
#[derive(Debug, Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<Option<CancelCause>>>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.cancel_with(CancelCause::Canceled);
    }

    pub fn cancel_with(&self, cause: CancelCause) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        });
    }

    /// Cancel with [`CancelCause::DeadlineExceeded`] once `after` elapses.
    ///
    /// Must be called from within a tokio runtime.
    pub fn cancel_after(&self, after: Duration) {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            handle.cancel_with(CancelCause::DeadlineExceeded);
        });
    }

    /// Non-blocking poll.
    pub fn cause(&self) -> Option<CancelCause> {
        self.tx.borrow().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Resolve once cancelled, yielding the cause.
    pub async fn cancelled(&self) -> CancelCause {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(cause) => cause.clone().unwrap_or(CancelCause::Canceled),
            // The sender lives in `self`, so the channel cannot close while we wait.
            Err(_) => CancelCause::Canceled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_is_not_cancelled() {
        let cancel = Cancellation::new();
        assert!(!cancel.is_cancelled());
        assert_eq!(cancel.cause(), None);
    }

    #[test]
    fn first_cause_wins() {
        let cancel = Cancellation::new();
        let clone = cancel.clone();
        clone.cancel();
        cancel.cancel_with(CancelCause::DeadlineExceeded);
        assert_eq!(cancel.cause(), Some(CancelCause::Canceled));
        assert_eq!(cancel.cause().map(|c| c.to_string()).as_deref(), Some("context canceled"));
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let cancel = Cancellation::new();
        let waiter = cancel.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        cancel.cancel();
        let cause = task.await.expect("join");
        assert_eq!(cause, CancelCause::Canceled);
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_cancelled() {
        let cancel = Cancellation::new();
        cancel.cancel_with(CancelCause::Other("shutting down".to_string()));
        assert_eq!(
            cancel.cancelled().await.to_string(),
            "shutting down".to_string()
        );
    }

    #[tokio::test]
    async fn cancel_after_reports_deadline() {
        let cancel = Cancellation::new();
        cancel.cancel_after(Duration::from_millis(10));
        let cause = tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .expect("deadline fired");
        assert_eq!(cause, CancelCause::DeadlineExceeded);
    }
}
