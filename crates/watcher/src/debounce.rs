//! Replace-on-arm debouncing
//!
//! Collapses bursts of qualifying events into one delayed callback. Each arm
//! spawns a timer task; arming again cancels the previous timer if it has
//! not fired yet. A timer that already fired keeps running its callback.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// Single-slot debounce timer
///
/// At most one timer is pending at any time. Dropping the debouncer cancels
/// the pending timer.
pub struct Debouncer {
    delay: Duration,
    /// Cancel handle of the most recently armed timer. Once that timer fires
    /// its receiver is dropped and a later cancel is a no-op.
    pending: Mutex<Option<oneshot::Sender<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Quiet period after the last arm before the callback runs
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `callback` to run once, `delay` from now
    ///
    /// Any pending (not yet fired) callback is cancelled first. Must be called
    /// from within a tokio runtime.
    pub fn arm<F, Fut>(&self, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + self.delay;
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.replace(cancel_tx) {
            // Fails when the previous timer has already fired
            if previous.send(()).is_ok() {
                debug!("Reset pending reload timer");
            }
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => return,
                _ = sleep_until(deadline) => {}
            }
            drop(cancel_rx);

            debug!("Debounce window of {:?} elapsed", delay);
            callback().await;
        });

        info!("Armed reload timer for {:?}", delay);
    }
}
