//! Recognising provider cooldown signals in failure text

use once_cell::sync::Lazy;
use regex::Regex;
use tickbridge_domain::TickbridgeError;

static RATE_LIMIT_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rate limit").expect("RATE_LIMIT_PHRASE should compile - this is a bug")
});

static SECONDS_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*seconds?").expect("SECONDS_HINT should compile - this is a bug")
});

/// Seconds to wait when `text` carries a rate-limit phrase and a "N seconds" figure
pub fn cooldown_hint(text: &str) -> Option<u64> {
    if !RATE_LIMIT_PHRASE.is_match(text) {
        return None;
    }
    SECONDS_HINT.captures(text).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
}

/// Failure classes the gateway distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Refused locally, nothing was sent
    RateLimitExceeded,
    /// Provider asked for a pause of the given seconds
    ProviderCooldown(u64),
    ConnectionFailed,
    /// Anything else the provider or network produced
    Transport,
}

impl FailureKind {
    pub fn of(err: &TickbridgeError) -> Self {
        match err {
            TickbridgeError::RateLimitExceeded { .. } => Self::RateLimitExceeded,
            TickbridgeError::ConnectionFailed(_) => Self::ConnectionFailed,
            other => {
                cooldown_hint(&other.to_string()).map_or(Self::Transport, Self::ProviderCooldown)
            }
        }
    }
}
