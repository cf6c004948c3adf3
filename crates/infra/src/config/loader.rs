//! Settings loader
//!
//! Loads [`Settings`] from a file and applies environment overrides.
//!
//! ## Loading Strategy
//! 1. `.env` in the working directory is loaded into the environment
//! 2. The settings file is taken from `TICKBRIDGE_CONFIG` or probed
//! 3. Without a file, defaults are used
//! 4. Environment overrides are applied last, then the result is validated
//!
//! ## Environment Variables
//! - `TICKBRIDGE_CONFIG`: Settings file path (`.toml` or `.json`)
//! - `TICKBRIDGE_API_TOKEN`: Toggl Track API token
//! - `TICKBRIDGE_WORKSPACE_ID`: Numeric workspace identifier
//! - `TICKBRIDGE_WORKSPACE_NAME`: Workspace display name
//! - `TICKBRIDGE_RATE_LIMIT_ENABLED`: Whether the hourly limiter is active
//! - `TICKBRIDGE_PLAN`: Plan override (`free`, `starter`, `premium`)
//! - `TICKBRIDGE_POLL_INTERVAL`: Timer poll interval in seconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tickbridge.toml` or `./tickbridge.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use tickbridge_domain::{PlanTier, Result, Settings, TickbridgeError};

use crate::errors::InfraError;

pub const CONFIG_PATH_VAR: &str = "TICKBRIDGE_CONFIG";

const CANDIDATE_NAMES: [&str; 4] =
    ["tickbridge.toml", "tickbridge.json", "config.toml", "config.json"];

/// Where settings came from, so writes can go back to the same file
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    /// `None` when no file was found and defaults were used
    pub path: Option<PathBuf>,
}

/// Load `.env`, the settings file and environment overrides
///
/// # Errors
/// Returns `TickbridgeError::Config` if the file is unreadable or invalid,
/// an override has an invalid value, or the result fails validation.
pub fn load() -> Result<LoadedSettings> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Could not load .env file"),
    }

    let path = match std::env::var(CONFIG_PATH_VAR) {
        Ok(explicit) => Some(PathBuf::from(explicit)),
        Err(_) => probe_config_paths(),
    };

    let mut settings = match &path {
        Some(path) => load_from_file(path)?,
        None => {
            tracing::info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    Ok(LoadedSettings { settings, path })
}

/// Load settings from a file
///
/// Format is detected by file extension (`.json` or `.toml`); missing
/// fields take their defaults.
///
/// # Errors
/// Returns `TickbridgeError::Config` if the file does not exist, cannot be
/// read, or is not valid for its format.
pub fn load_from_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(TickbridgeError::Config(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), "Loading settings from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| TickbridgeError::Config(format!("Failed to read settings file: {}", e)))?;

    parse_settings(&contents, path)
}

/// Parse settings from string content
///
/// # Errors
/// Returns `TickbridgeError::Config` if format is invalid or parsing fails.
pub(crate) fn parse_settings(contents: &str, path: &Path) -> Result<Settings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TickbridgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(TickbridgeError::Config(format!("Unsupported settings format: {}", extension))),
    }
}

/// Probe the standard locations for a settings file
///
/// # Returns
/// The first file found, or `None` if none exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CANDIDATE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Apply `TICKBRIDGE_*` overrides on top of file settings
///
/// # Errors
/// Returns `TickbridgeError::Config` when a variable is set to a value that
/// cannot be parsed.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
    if let Some(token) = env_opt("TICKBRIDGE_API_TOKEN") {
        settings.api_token = Some(token);
    }

    if let Some(id) = env_opt("TICKBRIDGE_WORKSPACE_ID") {
        let id: u64 = id
            .parse()
            .map_err(|e| TickbridgeError::Config(format!("Invalid workspace id: {}", e)))?;
        settings.workspace.id = id.to_string();
    }
    if let Some(name) = env_opt("TICKBRIDGE_WORKSPACE_NAME") {
        settings.workspace.name = name;
    }

    settings.rate_limit_enabled =
        env_bool("TICKBRIDGE_RATE_LIMIT_ENABLED", settings.rate_limit_enabled);

    if let Some(plan) = env_opt("TICKBRIDGE_PLAN") {
        let tier: PlanTier = plan.parse().map_err(TickbridgeError::Config)?;
        settings.plan_override = Some(tier);
    }

    if let Some(secs) = env_opt("TICKBRIDGE_POLL_INTERVAL") {
        let secs: u64 = secs
            .parse()
            .map_err(|e| TickbridgeError::Config(format!("Invalid poll interval: {}", e)))?;
        settings.polling.timer_interval_ms = secs.saturating_mul(1000);
    }

    Ok(())
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
