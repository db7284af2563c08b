//! Debounced auto-refresh.
//!
//! [`AutoRefresh`] periodically signals that the Images and Containers
//! branches changed. A [`poke`](AutoRefresh::poke) cancels the pending
//! tick and restarts the delay instead of queueing another firing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::provider::ExplorerProvider;

/// Default auto-refresh interval in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: i64 = 1000;

/// Debounce state for delayed requests.
///
/// Each trigger gets a new request ID. A wait that finishes with a stale
/// ID, or is interrupted by a newer trigger, is cancelled.
#[derive(Debug)]
pub struct DebounceState {
    delay: Duration,

    /// Current request ID (incremented on each trigger).
    current_id: AtomicU64,

    /// Wakes pending waits on trigger or cancel.
    cancel_notify: Arc<Notify>,
}

impl DebounceState {
    /// Creates a debounce state with the given delay.
    ///
    /// # Panics
    ///
    /// Panics if delay is zero.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        assert!(!delay.is_zero(), "debounce delay must be positive");

        Self {
            delay,
            current_id: AtomicU64::new(0),
            cancel_notify: Arc::new(Notify::new()),
        }
    }

    /// Starts a new request, cancelling any pending one.
    pub fn trigger(&self) -> u64 {
        let id = self.current_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_notify.notify_waiters();
        id
    }

    /// Waits for the delay. Returns `None` if a newer request arrived.
    pub async fn wait(&self, request_id: u64) -> Option<u64> {
        let cancel_notify = Arc::clone(&self.cancel_notify);

        tokio::select! {
            () = tokio::time::sleep(self.delay) => {
                self.is_valid(request_id).then_some(request_id)
            }
            () = cancel_notify.notified() => None,
        }
    }

    /// Cancels any pending request.
    pub fn cancel(&self) {
        self.current_id.fetch_add(1, Ordering::SeqCst);
        self.cancel_notify.notify_waiters();
    }

    #[must_use]
    pub fn current_id(&self) -> u64 {
        self.current_id.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_valid(&self, request_id: u64) -> bool {
        self.current_id.load(Ordering::SeqCst) == request_id
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

/// Background task firing the images and containers refresh signals.
///
/// The task is aborted when this handle is dropped.
#[derive(Debug)]
pub struct AutoRefresh {
    debounce: Arc<DebounceState>,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    /// Starts the timer. Returns `None` if `interval_ms <= 0`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(provider: Arc<ExplorerProvider>, interval_ms: i64) -> Option<Self> {
        let Ok(millis) = u64::try_from(interval_ms) else {
            tracing::info!("Auto refresh disabled (interval {} ms)", interval_ms);
            return None;
        };
        if millis == 0 {
            tracing::info!("Auto refresh disabled (interval 0 ms)");
            return None;
        }

        let debounce = Arc::new(DebounceState::new(Duration::from_millis(millis)));
        let task_debounce = Arc::clone(&debounce);

        let handle = tokio::spawn(async move {
            loop {
                let id = task_debounce.current_id();
                if task_debounce.wait(id).await.is_some() {
                    provider.refresh_images();
                    provider.refresh_containers();
                }
            }
        });

        tracing::info!("Auto refresh every {} ms", millis);
        Some(Self { debounce, handle })
    }

    /// Cancels the pending tick and restarts the delay.
    pub fn poke(&self) {
        self.debounce.trigger();
    }

    /// Returns the refresh interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.debounce.delay()
    }

    /// Stops the timer.
    pub fn stop(&self) {
        self.debounce.cancel();
        self.handle.abort();
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
