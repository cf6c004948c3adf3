//! Wall-clock source for the quota limiter and the synchronizer.
//!
//! Quota windows are stored as epoch milliseconds in the settings file, so
//! the clock speaks epoch milliseconds too. Tests move time by hand with
//! [`MockClock`] instead of sleeping through hour-long windows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the UNIX epoch
    fn millis_since_epoch(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn millis_since_epoch(&self) -> u64 {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX)
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn millis_since_epoch(&self) -> u64 {
        (**self).millis_since_epoch()
    }
}

/// Manually driven clock; clones share one reading
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    millis: Arc<AtomicU64>,
}

impl MockClock {
    /// Clock reading the UNIX epoch
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_epoch_millis(millis: u64) -> Self {
        Self { millis: Arc::new(AtomicU64::new(millis)) }
    }

    pub fn advance(&self, duration: Duration) {
        let step = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(step, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_millis(secs.saturating_mul(1_000));
    }
}

impl Clock for MockClock {
    fn millis_since_epoch(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
