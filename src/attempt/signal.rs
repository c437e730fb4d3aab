//! Cooperative cancellation for attempts that time out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cancellation flag handed to each attempt of a cancellable producer.
///
/// When an attempt loses its timeout race the attempt's future is dropped,
/// which stops it at its next suspension point. Work it handed off elsewhere
/// (spawned tasks, threads) keeps running unless it watches this signal.
/// The signal is triggered once and stays triggered.
///
/// # Example
///
/// ```rust
/// use caught::{Attempt, CancelSignal};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let attempt = Attempt::from_fn_cancellable(|signal: CancelSignal| async move {
///     let worker = tokio::spawn({
///         let signal = signal.clone();
///         async move {
///             tokio::select! {
///                 _ = signal.cancelled() => "stopped",
///                 _ = tokio::time::sleep(Duration::from_secs(5)) => "finished",
///             }
///         }
///     });
///     worker.await.map_err(|e| e.to_string())
/// })
/// .with_timeout(Duration::from_millis(10));
///
/// assert!(attempt.await.is_err());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    state: Arc<SignalState>,
}

impl CancelSignal {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal and wake everything waiting on it.
    pub fn cancel(&self) {
        if self
            .state
            .cancelled
            .compare_exchange(false, true, Ordering::Release, Ordering::Relaxed)
            .is_ok()
        {
            self.state.notify.notify_waiters();
        }
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once the signal is triggered.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
