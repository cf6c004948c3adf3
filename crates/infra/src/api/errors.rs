//! Toggl API error classification
//!
//! HTTP-level failures are categorised here and then folded into the domain
//! error. Rate-limit responses keep the provider's body text so the gateway
//! can read the cooldown hint out of it.

use reqwest::StatusCode;
use thiserror::Error;
use tickbridge_domain::TickbridgeError;

/// Toggl API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("{body}")]
    RateLimit { status: u16, body: String },

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Client error ({status}): {body}")]
    Client { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success response
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        let code = status.as_u16();
        let body = body.into();
        let body = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            body.trim().to_string()
        };
        match code {
            401 | 403 => Self::Auth { status: code, body },
            402 | 429 => Self::RateLimit { status: code, body },
            500..=599 => Self::Server { status: code, body },
            _ => Self::Client { status: code, body },
        }
    }
}

impl From<ApiError> for TickbridgeError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth { status, body } => Self::Auth(format!("HTTP {status}: {body}")),
            ApiError::RateLimit { status, body }
            | ApiError::Server { status, body }
            | ApiError::Client { status, body } => Self::Provider { status, message: body },
            ApiError::Decode(message) => Self::Internal(format!("unexpected response: {message}")),
        }
    }
}
