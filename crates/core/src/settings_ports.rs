//! Port for writing settings changes back to storage

use tickbridge_common::resilience::QuotaWindow;
use tickbridge_domain::{Result, WorkspaceRef};

/// Persists the settings fields the core mutates
///
/// Calls happen on the request path, so implementations should keep them
/// short (a small file write at most).
pub trait SettingsStore: Send + Sync {
    /// Save `used_this_hour`, `hour_window_start` and `hourly_cap`
    fn persist_quota(&self, window: &QuotaWindow) -> Result<()>;

    /// Save an automatically selected workspace
    fn persist_workspace(&self, workspace: &WorkspaceRef) -> Result<()>;
}
