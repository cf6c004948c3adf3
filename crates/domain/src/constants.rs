//! Application constants
//!
//! Centralized location for domain-level constants.

// Polling cadence
pub const ACTIVE_TIMER_POLLING_INTERVAL_MS: u64 = 30_000;
pub const STATUS_BAR_UPDATE_INTERVAL_MS: u64 = 1_000;

// Plan tier caps (requests per hour)
pub const FREE_HOURLY_CAP: u32 = 30;
pub const STARTER_HOURLY_CAP: u32 = 240;
pub const PREMIUM_HOURLY_CAP: u32 = 600;

// Quota display
pub const LOW_QUOTA_RATIO: f64 = 0.2;
pub const LOW_QUOTA_MARKER: &str = "\u{26a0} ";

// Status line
pub const TITLE_TRUNCATE_SUFFIX: &str = "...";
pub const NO_DESCRIPTION: &str = "No description";
pub const NO_PROJECT: &str = "No project";
pub const CONNECTING_MESSAGE: &str = "Connecting to Toggl...";
pub const NO_TOKEN_STATUS: &str = "Open settings to add a Toggl API token.";
pub const UNREACHABLE_STATUS: &str = "Cannot connect to Toggl API";

// Workspace placeholder used before one is selected
pub const UNSELECTED_WORKSPACE_ID: &str = "none";
pub const UNSELECTED_WORKSPACE_NAME: &str = "None selected";

// Provider
pub const DEFAULT_API_BASE_URL: &str = "https://api.track.toggl.com";
pub const CREATED_WITH: &str = "Tickbridge";
pub const RECENT_ENTRIES_DAYS: i64 = 9;

// Running-timer durations at or beyond this magnitude encode a negated
// start epoch rather than negated elapsed seconds.
pub const EPOCH_ENCODED_DURATION_THRESHOLD: i64 = 1_000_000_000;
