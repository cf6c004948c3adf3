use std::time::{Duration, Instant};

use tickbridge_domain::{Result, TickbridgeError};
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"timer::start_timer"`).
/// * `elapsed` - Duration the command execution took.
/// * `error` - The failure, if the command failed.
///
/// Callers must avoid forwarding sensitive values (tokens) in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&TickbridgeError>) {
    let duration_ms = elapsed.as_millis() as u64;

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => warn!(
            command,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "command_execution_failure"
        ),
    }
}

/// Run `operation` and log its outcome under `command`
pub async fn instrument_command<T, F>(command: &'static str, operation: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = operation.await;
    log_command_execution(command, start.elapsed(), result.as_ref().err());
    result
}

/// Convert a `TickbridgeError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &TickbridgeError) -> &'static str {
    match error {
        TickbridgeError::Config(_) => "config",
        TickbridgeError::Network(_) => "network",
        TickbridgeError::Auth(_) => "auth",
        TickbridgeError::NotFound(_) => "not_found",
        TickbridgeError::InvalidInput(_) => "invalid_input",
        TickbridgeError::Internal(_) => "internal",
        TickbridgeError::Provider { .. } => "provider",
        TickbridgeError::RateLimitExceeded { .. } => "rate_limited",
        TickbridgeError::ConnectionFailed(_) => "connection_failed",
        TickbridgeError::TransportUnavailable(_) => "transport_unavailable",
        TickbridgeError::TransientFetch { .. } => "transient_fetch",
        TickbridgeError::PartialPreload { .. } => "partial_preload",
        TickbridgeError::NoToken => "no_token",
        TickbridgeError::Unavailable(_) => "unavailable",
        TickbridgeError::ActionInProgress => "action_in_progress",
        TickbridgeError::StaleGeneration => "stale_generation",
    }
}
