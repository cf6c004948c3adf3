//! Cancellable fixed-interval task
//!
//! The first tick fires immediately. Cancelling stops future ticks; a tick
//! that is already running is allowed to finish.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a spawned periodic loop; dropping it cancels the loop
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period` until cancelled or `tick` breaks
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(task = name, period_ms = period.as_millis(), "Periodic task started");

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(task = name, "Periodic task cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        if tick().await.is_break() {
                            debug!(task = name, "Periodic task finished");
                            break;
                        }
                    }
                }
            }
        });

        Self { name, cancel, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop scheduling further ticks
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
