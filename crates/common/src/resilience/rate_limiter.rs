//! Hourly quota limiter for providers that meter requests per clock hour
//!
//! The limiter is optimistic and purely local: it never asks the provider for
//! its real counter. Consumption is estimated against a fixed cap over a
//! 60-minute window, and a provider-signalled cooldown can be layered on top
//! as a temporary suspension that blocks independently of the cap.
//!
//! Rollover is lazy. Every query first checks whether the window has aged
//! past [`WINDOW_LENGTH`] and, if so, starts a fresh window at the current
//! time with zero usage and no suspension.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Clock, SystemClock};
use crate::time::format::format_duration;

/// Length of one accounting window
pub const WINDOW_LENGTH: Duration = Duration::from_secs(60 * 60);

const WINDOW_LENGTH_MS: u64 = 60 * 60 * 1000;

/// Snapshot of the accounting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaWindow {
    /// Window start, milliseconds since the UNIX epoch
    pub window_start_ms: u64,
    /// Requests consumed in this window
    pub used: u32,
    /// Cap in force for this window
    pub cap: u32,
    /// End of a provider-signalled cooldown, milliseconds since the epoch
    pub suspended_until_ms: Option<u64>,
}

/// Configuration for [`HourlyQuotaLimiter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaConfig {
    /// When false every consumption succeeds without touching the window
    pub enabled: bool,
    /// Requests allowed per window
    pub cap: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { enabled: true, cap: 30 }
    }
}

impl QuotaConfig {
    /// Create a new configuration builder
    pub fn builder() -> QuotaConfigBuilder {
        QuotaConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cap == 0 {
            return Err("cap must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for QuotaConfig
#[derive(Debug)]
pub struct QuotaConfigBuilder {
    config: QuotaConfig,
}

impl Default for QuotaConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaConfigBuilder {
    pub fn new() -> Self {
        Self { config: QuotaConfig::default() }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn cap(mut self, cap: u32) -> Self {
        self.config.cap = cap;
        self
    }

    pub fn build(self) -> Result<QuotaConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Read-only view of the current window for settings and status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub used: u32,
    pub cap: u32,
    pub remaining: u32,
    pub resets_in: Duration,
}

impl fmt::Display for QuotaUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Minute precision is all the provider's hourly metering warrants.
        let minutes = self.resets_in.as_secs().div_ceil(60);
        write!(
            f,
            "Usage this hour: {}/{} - resets in ~{}",
            self.used,
            self.cap,
            format_duration(Duration::from_secs(minutes * 60))
        )
    }
}

/// Callback invoked with the new window after every state change
pub type QuotaListener = Arc<dyn Fn(&QuotaWindow) + Send + Sync>;

/// Hourly sliding-window limiter with temporary suspension
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "runtime")]
/// # {
/// use tickbridge_common::resilience::{HourlyQuotaLimiter, QuotaConfig};
///
/// let limiter = HourlyQuotaLimiter::new(QuotaConfig { enabled: true, cap: 2 });
/// assert!(limiter.try_consume(1));
/// assert!(limiter.try_consume(1));
/// assert!(!limiter.try_consume(1));
/// assert_eq!(limiter.remaining(), 0);
/// # }
/// ```
pub struct HourlyQuotaLimiter<C: Clock = SystemClock> {
    config: Mutex<QuotaConfig>,
    window: Mutex<QuotaWindow>,
    clock: Arc<C>,
    listener: Mutex<Option<QuotaListener>>,
}

impl<C: Clock> fmt::Debug for HourlyQuotaLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HourlyQuotaLimiter")
            .field("config", &*self.config.lock())
            .field("window", &*self.window.lock())
            .finish_non_exhaustive()
    }
}

impl HourlyQuotaLimiter<SystemClock> {
    /// Create a limiter with a fresh window on the system clock
    pub fn new(config: QuotaConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> HourlyQuotaLimiter<C> {
    /// Create a limiter with a fresh window starting now
    pub fn with_clock(config: QuotaConfig, clock: C) -> Self {
        let start = clock.millis_since_epoch();
        Self::restore(config, 0, start, clock)
    }

    /// Resume a previously persisted window
    ///
    /// A window start in the distant past (including zero) simply rolls over
    /// on first use.
    pub fn restore(config: QuotaConfig, used: u32, window_start_ms: u64, clock: C) -> Self {
        let window =
            QuotaWindow { window_start_ms, used, cap: config.cap, suspended_until_ms: None };
        Self {
            config: Mutex::new(config),
            window: Mutex::new(window),
            clock: Arc::new(clock),
            listener: Mutex::new(None),
        }
    }

    /// Register a callback that receives the window after each change
    pub fn set_listener(&self, listener: QuotaListener) {
        *self.listener.lock() = Some(listener);
    }

    /// Whether limiting is active
    pub fn is_enabled(&self) -> bool {
        self.config.lock().enabled
    }

    /// Replace enablement and cap without touching usage
    pub fn reconfigure(&self, config: QuotaConfig) {
        let cap = config.cap;
        *self.config.lock() = config;
        self.with_window(|window, _| window.cap = cap);
    }

    /// Requests left in the current window, never negative
    pub fn remaining(&self) -> u32 {
        self.with_window(|window, _| window.cap.saturating_sub(window.used))
    }

    /// True while a suspension is unexpired or the cap is exhausted
    pub fn is_blocked(&self) -> bool {
        self.with_window(|window, now| blocked(window, now))
    }

    /// Account for `n` requests, returning false without mutation if blocked
    ///
    /// Consumption that would push usage past the cap is refused as well, so
    /// `used` never exceeds `cap`. When limiting is disabled this always
    /// succeeds and leaves the window untouched.
    pub fn try_consume(&self, n: u32) -> bool {
        if !self.is_enabled() {
            return true;
        }

        self.with_window(|window, now| {
            if blocked(window, now) || window.used.saturating_add(n) > window.cap {
                debug!(used = window.used, cap = window.cap, "quota: request refused");
                return false;
            }
            window.used += n;
            true
        })
    }

    /// Block all requests for `seconds`, independent of the cap
    pub fn apply_temporary_suspension(&self, seconds: u64) {
        self.with_window(|window, now| {
            let until = now.saturating_add(seconds.saturating_mul(1000));
            window.suspended_until_ms = Some(until);
            info!(seconds, suspended_until_ms = until, "quota: provider cooldown applied");
        });
    }

    /// How long until requests are allowed again, if currently blocked
    ///
    /// An unexpired suspension wins; otherwise an exhausted cap waits for the
    /// window to roll over.
    pub fn blocked_for(&self) -> Option<Duration> {
        self.with_window(|window, now| {
            if let Some(until) = window.suspended_until_ms.filter(|until| *until > now) {
                return Some(Duration::from_millis(until - now));
            }
            (window.used >= window.cap)
                .then(|| Duration::from_millis(window_end(window).saturating_sub(now)))
        })
    }

    /// Usage summary after applying any due rollover
    pub fn usage(&self) -> QuotaUsage {
        self.with_window(|window, now| QuotaUsage {
            used: window.used,
            cap: window.cap,
            remaining: window.cap.saturating_sub(window.used),
            resets_in: Duration::from_millis(window_end(window).saturating_sub(now)),
        })
    }

    /// Raw window snapshot without applying rollover
    pub fn window(&self) -> QuotaWindow {
        *self.window.lock()
    }

    /// Start a fresh window immediately
    pub fn reset(&self) {
        self.with_window(|window, now| {
            window.window_start_ms = now;
            window.used = 0;
            window.suspended_until_ms = None;
        });
    }

    /// Run `f` on the window after a due rollover, notifying on change
    fn with_window<R>(&self, f: impl FnOnce(&mut QuotaWindow, u64) -> R) -> R {
        let now = self.clock.millis_since_epoch();
        let (result, changed) = {
            let mut window = self.window.lock();
            let before = *window;
            if now.saturating_sub(window.window_start_ms) >= WINDOW_LENGTH_MS {
                debug!(previous_used = window.used, "quota: window rolled over");
                window.window_start_ms = now;
                window.used = 0;
                window.suspended_until_ms = None;
            }
            let result = f(&mut window, now);
            (result, (*window != before).then_some(*window))
        };

        if let Some(snapshot) = changed {
            let listener = self.listener.lock().clone();
            if let Some(listener) = listener {
                listener(&snapshot);
            }
        }
        result
    }
}

fn blocked(window: &QuotaWindow, now: u64) -> bool {
    window.suspended_until_ms.is_some_and(|until| now < until) || window.used >= window.cap
}

fn window_end(window: &QuotaWindow) -> u64 {
    window.window_start_ms.saturating_add(WINDOW_LENGTH_MS)
}
