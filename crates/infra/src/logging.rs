//! Tracing subscriber setup for binaries

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "TICKBRIDGE_LOG_FORMAT";

const DEFAULT_FILTER: &str = "tickbridge=info,tickbridge_core=info,tickbridge_infra=info";

/// Install the global subscriber
///
/// `RUST_LOG` overrides the default filter. Setting `TICKBRIDGE_LOG_FORMAT=json`
/// switches to JSON lines. Calling this twice is harmless; the second call
/// leaves the first subscriber in place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|value| value.eq_ignore_ascii_case("json"));

    let result = if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
