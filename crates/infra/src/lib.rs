//! # Tickbridge Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The Toggl Track HTTP client (v9 API and Reports v3)
//! - The identity probe and the per-token transport factory
//! - Settings loading from files and environment, and file persistence
//! - Notification sinks and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `tickbridge-core`
//! - Depends on `tickbridge-common`, `tickbridge-domain` and `tickbridge-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod notifications;

// Re-export commonly used items
pub use api::{IdentityProbe, TogglClient, TogglClientConfig, TogglTransportFactory};
pub use config::{FileSettingsStore, LoadedSettings, MemorySettingsStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use logging::init_tracing;
pub use notifications::{ChannelNotifier, TracingNotifier};
