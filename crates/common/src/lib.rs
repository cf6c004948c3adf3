//! Domain-free building blocks shared across Tickbridge crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: duration formatting
//! - `runtime`: clock abstraction, hourly quota limiter, serial queue

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{
    Clock, HourlyQuotaLimiter, MockClock, QueueError, QuotaConfig, QuotaUsage, QuotaWindow,
    SerialQueue, SerialQueueConfig, SystemClock,
};
#[cfg(feature = "foundation")]
pub use time::{format_duration, format_duration_template};
