//! Settings model
//!
//! Components never read settings from ambient state. They receive a
//! [`SettingsSnapshot`] at construction and are refreshed through an explicit
//! update call carrying a newer snapshot.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ACTIVE_TIMER_POLLING_INTERVAL_MS, DEFAULT_API_BASE_URL, FREE_HOURLY_CAP, PREMIUM_HOURLY_CAP,
    STARTER_HOURLY_CAP, STATUS_BAR_UPDATE_INTERVAL_MS, UNSELECTED_WORKSPACE_ID,
    UNSELECTED_WORKSPACE_NAME,
};
use crate::errors::{Result, TickbridgeError};
use crate::impl_domain_status_conversions;

/// Named quota class of the provider account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Starter,
    Premium,
}

impl_domain_status_conversions!(PlanTier {
    Free => "free",
    Starter => "starter",
    Premium => "premium",
});

impl PlanTier {
    /// Requests per hour allowed for this tier
    pub const fn hourly_cap(self) -> u32 {
        match self {
            Self::Free => FREE_HOURLY_CAP,
            Self::Starter => STARTER_HOURLY_CAP,
            Self::Premium => PREMIUM_HOURLY_CAP,
        }
    }
}

/// Workspace the timer belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRef {
    pub id: String,
    pub name: String,
}

impl Default for WorkspaceRef {
    fn default() -> Self {
        Self { id: UNSELECTED_WORKSPACE_ID.to_string(), name: UNSELECTED_WORKSPACE_NAME.to_string() }
    }
}

impl WorkspaceRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id: id.to_string(), name: name.into() }
    }

    /// Numeric identifier, or `None` while the placeholder is configured
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }

    pub fn is_selected(&self) -> bool {
        self.numeric_id().is_some()
    }
}

/// Status line presentation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusBarSettings {
    /// Maximum characters of the timer title before truncation
    pub char_limit: usize,
    /// Duration template, see `format_duration_template`
    pub format: String,
    pub prefix: String,
    pub show_project: bool,
    pub no_entry_message: String,
}

impl Default for StatusBarSettings {
    fn default() -> Self {
        Self {
            char_limit: 40,
            format: "m [minute]".to_string(),
            prefix: "Timer: ".to_string(),
            show_project: false,
            no_entry_message: "-".to_string(),
        }
    }
}

/// Loop cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub timer_interval_ms: u64,
    pub status_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            timer_interval_ms: ACTIVE_TIMER_POLLING_INTERVAL_MS,
            status_interval_ms: STATUS_BAR_UPDATE_INTERVAL_MS,
        }
    }
}

/// Provider endpoint and HTTP options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            user_agent: format!("tickbridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_token: Option<String>,
    pub workspace: WorkspaceRef,
    pub rate_limit_enabled: bool,
    pub plan_override: Option<PlanTier>,
    pub hourly_cap: u32,
    pub used_this_hour: u32,
    /// Start of the quota window, epoch milliseconds
    pub hour_window_start: u64,
    pub status_bar: StatusBarSettings,
    pub polling: PollingSettings,
    pub api: ApiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_token: None,
            workspace: WorkspaceRef::default(),
            rate_limit_enabled: true,
            plan_override: None,
            hourly_cap: FREE_HOURLY_CAP,
            used_this_hour: 0,
            hour_window_start: 0,
            status_bar: StatusBarSettings::default(),
            polling: PollingSettings::default(),
            api: ApiSettings::default(),
        }
    }
}

impl Settings {
    /// Token, treating an empty string as absent
    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref().map(str::trim).filter(|token| !token.is_empty())
    }

    /// Plan override cap, else the stored cap, else the free tier
    pub fn effective_cap(&self) -> u32 {
        match self.plan_override {
            Some(tier) => tier.hourly_cap(),
            None if self.hourly_cap > 0 => self.hourly_cap,
            None => PlanTier::Free.hourly_cap(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.timer_interval_ms == 0 || self.polling.status_interval_ms == 0 {
            return Err(TickbridgeError::Config("polling intervals must be non-zero".into()));
        }
        if self.status_bar.char_limit < 4 {
            return Err(TickbridgeError::Config("status_bar.char_limit must be at least 4".into()));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(TickbridgeError::Config("api.base_url must not be empty".into()));
        }
        if self.api.max_attempts == 0 {
            return Err(TickbridgeError::Config("api.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Versioned settings handed to components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub version: u64,
    pub settings: Settings,
}

impl SettingsSnapshot {
    pub const fn initial(settings: Settings) -> Self {
        Self { version: 1, settings }
    }

    /// A snapshot one version newer carrying `settings`
    #[must_use]
    pub const fn next(&self, settings: Settings) -> Self {
        Self { version: self.version + 1, settings }
    }

    pub const fn is_newer_than(&self, version: u64) -> bool {
        self.version > version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_cap_precedence() {
        let mut settings = Settings { hourly_cap: 100, ..Settings::default() };
        assert_eq!(settings.effective_cap(), 100);

        settings.plan_override = Some(PlanTier::Premium);
        assert_eq!(settings.effective_cap(), 600);

        settings.plan_override = None;
        settings.hourly_cap = 0;
        assert_eq!(settings.effective_cap(), 30);
    }

    #[test]
    fn test_plan_tier_parsing() {
        assert_eq!("Starter".parse::<PlanTier>(), Ok(PlanTier::Starter));
        assert!("enterprise".parse::<PlanTier>().is_err());
        assert_eq!(PlanTier::Starter.hourly_cap(), 240);
    }

    #[test]
    fn test_placeholder_workspace_is_unselected() {
        assert!(!WorkspaceRef::default().is_selected());
        assert_eq!(WorkspaceRef::new(42, "Acme").numeric_id(), Some(42));
    }

    #[test]
    fn test_blank_token_is_absent() {
        let settings = Settings { api_token: Some("  ".to_string()), ..Settings::default() };
        assert_eq!(settings.token(), None);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.polling.timer_interval_ms = 0;
        assert!(matches!(settings.validate(), Err(TickbridgeError::Config(_))));
    }

    #[test]
    fn test_snapshot_versions() {
        let first = SettingsSnapshot::initial(Settings::default());
        let second = first.next(Settings::default());
        assert!(second.is_newer_than(first.version));
        assert!(!first.is_newer_than(second.version));
    }
}
