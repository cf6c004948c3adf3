//! Connection, quota and settings commands

use chrono::{DateTime, Utc};
use serde::Serialize;
use tickbridge_domain::{ApiStatus, ProjectSummaryItem, Result, TimeEntry, WorkspaceRef};

use crate::utils::logging::instrument_command;
use crate::AppContext;

/// Everything a status bar frontend renders
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub api_status: ApiStatus,
    pub status_line: String,
    pub workspace: WorkspaceRef,
    pub timer: Option<TimeEntry>,
    pub daily_summary: Vec<ProjectSummaryItem>,
    pub quota: Option<QuotaSnapshot>,
    pub timestamp: DateTime<Utc>,
}

/// Hourly quota usage; absent while rate limiting is disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaSnapshot {
    pub used: u32,
    pub cap: u32,
    pub remaining: u32,
    pub resets_in_secs: u64,
}

pub fn get_status(ctx: &AppContext) -> StatusSnapshot {
    let sync = &ctx.synchronizer;
    let quota = ctx.gateway.is_rate_limit_enabled().then(|| {
        let usage = ctx.gateway.quota_usage();
        QuotaSnapshot {
            used: usage.used,
            cap: usage.cap,
            remaining: usage.remaining,
            resets_in_secs: usage.resets_in.as_secs(),
        }
    });

    StatusSnapshot {
        api_status: sync.status(),
        status_line: sync.status_line(),
        workspace: ctx.gateway.workspace(),
        timer: sync.current_timer(),
        daily_summary: sync.daily_summary(),
        quota,
        timestamp: ctx.gateway.now(),
    }
}

/// Reconnect with the configured token
pub async fn reconnect(ctx: &AppContext) -> Result<ApiStatus> {
    instrument_command("status::reconnect", async {
        ctx.start().await?;
        Ok(ctx.synchronizer.status())
    })
    .await
}

/// Re-read the settings file; returns whether a reconnect happened
pub async fn reload_settings(ctx: &AppContext) -> Result<bool> {
    instrument_command("status::reload_settings", ctx.reload_settings()).await
}

/// Forget local quota usage, e.g. after upgrading the plan
pub fn reset_quota(ctx: &AppContext) {
    ctx.gateway.reset_quota();
    ctx.synchronizer.refresh_status_line();
}
