//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ApiStatus;

/// Main error type for Tickbridge
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TickbridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// The provider answered with a non-success status
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Local hourly cap or cooldown refused the request before dispatch
    #[error("Rate limit exceeded (local limiter), resets in {resets_in_secs}s")]
    RateLimitExceeded { resets_in_secs: u64 },

    /// Neither the primary transport nor the fallback probe reached the provider
    #[error("Cannot connect to Toggl API (client + fallback failed): {0}")]
    ConnectionFailed(String),

    /// The provider is reachable but the primary transport could not verify
    #[error("Toggl API is reachable but the client check failed: {0}")]
    TransportUnavailable(String),

    /// A read failed after connecting; already logged and notified
    #[error("{operation} failed: {message}")]
    TransientFetch { operation: String, message: String },

    /// Some reference collections could not be loaded
    #[error("Failed to load workspace data: {}", failed.join(", "))]
    PartialPreload { failed: Vec<String> },

    #[error("No Toggl Track API token is set")]
    NoToken,

    #[error("Toggl Track API is not available ({0})")]
    Unavailable(ApiStatus),

    #[error("A timer action is already in progress")]
    ActionInProgress,

    /// The connection was reset while the request was in flight
    #[error("Result discarded after connection reset")]
    StaleGeneration,
}

impl TickbridgeError {
    /// Wrap a read failure for the named operation
    pub fn transient(operation: impl Into<String>, source: &Self) -> Self {
        Self::TransientFetch { operation: operation.into(), message: source.to_string() }
    }

    /// True for failures produced locally without contacting the provider
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. }
                | Self::NoToken
                | Self::Unavailable(_)
                | Self::ActionInProgress
                | Self::StaleGeneration
                | Self::InvalidInput(_)
                | Self::Config(_)
        )
    }
}

/// Result type alias for Tickbridge operations
pub type Result<T> = std::result::Result<T, TickbridgeError>;
