//! # Tickbridge Domain
//!
//! Business domain types for the Tickbridge client layer.
//!
//! This crate contains:
//! - Timer, reference-data and report types
//! - Domain error types and Result definitions
//! - Settings model and versioned snapshots
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Tickbridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
