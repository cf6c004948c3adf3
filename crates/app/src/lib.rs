//! # Tickbridge App
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands (frontend → backend bridge)
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Provides commands for whichever frontend renders the status line

pub mod commands;
pub mod context;
pub mod runner;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
pub use runner::run_until;
