//! Time formatting helpers
//!
//! - [`format`]: human-readable durations and template-driven formatting

pub mod format;

pub use format::{format_duration, format_duration_template};
