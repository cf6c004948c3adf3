//! Resilience primitives for talking to a metered remote service
//!
//! - [`Clock`]: time abstraction with a [`MockClock`] for tests
//! - [`HourlyQuotaLimiter`]: per-hour request accounting with provider
//!   cooldown suspension
//! - [`SerialQueue`]: single-flight executor for heavy requests

pub mod clock;
pub mod rate_limiter;
pub mod serial_queue;

pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::{
    HourlyQuotaLimiter, QuotaConfig, QuotaConfigBuilder, QuotaListener, QuotaUsage, QuotaWindow,
    WINDOW_LENGTH,
};
pub use serial_queue::{QueueError, SerialQueue, SerialQueueConfig};
