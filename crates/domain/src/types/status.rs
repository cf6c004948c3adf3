//! Availability state and user-facing notices

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Availability of the provider as seen by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiStatus {
    /// Initial state, and the state while a connection attempt runs
    #[default]
    Untested,
    NoToken,
    Available,
    /// The initial connection test failed; polling is stopped
    Unreachable,
    /// Polling was healthy and the latest poll failed
    Degraded,
}

impl_domain_status_conversions!(ApiStatus {
    Untested => "untested",
    NoToken => "no_token",
    Available => "available",
    Unreachable => "unreachable",
    Degraded => "degraded",
});

impl ApiStatus {
    /// Whether user-triggered calls may proceed
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Whether the poll loop should keep querying the provider
    pub const fn is_polling(self) -> bool {
        matches!(self, Self::Available | Self::Degraded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }
}
