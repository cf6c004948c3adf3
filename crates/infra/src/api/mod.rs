//! Toggl Track API adapters
//!
//! - [`TogglClient`]: the primary transport (v9 REST + Reports v3)
//! - [`IdentityProbe`]: fallback reachability check against `/api/v9/me`
//! - [`TogglTransportFactory`]: builds a client per API token

pub mod client;
pub mod errors;
pub mod factory;
pub mod probe;

pub use client::{TogglClient, TogglClientConfig};
pub use errors::ApiError;
pub use factory::TogglTransportFactory;
pub use probe::IdentityProbe;
