//! One-shot cancellation signal
//!
//! A `CancelToken` fires at most once and wakes every task waiting on it.
//! Adapters use one internally to release tasks parked in read, write or
//! accept when the adapter is closed. Callers can hand one to a single dial
//! to abort just that attempt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

struct Signal {
    fired: AtomicBool,
    notify: Notify,
}

/// Cloneable one-shot cancellation handle
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Signal>,
}

impl CancelToken {
    /// Fresh token that has not fired
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Signal {
                fired: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Fire the token. Returns `true` only for the call that fired it.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.fired.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    /// Whether the token has fired
    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Wait until the token fires
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel can't slip between.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
