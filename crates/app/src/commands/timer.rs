//! Timer commands

use tickbridge_domain::{DetailedReportItem, NewTimeEntry, Result, TimeEntry, TimerTransition};
use tracing::info;

use crate::utils::logging::instrument_command;
use crate::AppContext;

/// Start a timer in the selected workspace
pub async fn start_timer(ctx: &AppContext, entry: NewTimeEntry) -> Result<TimeEntry> {
    instrument_command("timer::start_timer", async {
        info!(project_id = ?entry.project_id, "Starting timer");
        ctx.synchronizer.start_timer(entry).await
    })
    .await
}

/// Start a new timer copying a recent entry's details
pub async fn restart_entry(ctx: &AppContext, item: &DetailedReportItem) -> Result<TimeEntry> {
    instrument_command("timer::restart_entry", async {
        ctx.synchronizer.start_timer(entry_from_recent(item)).await
    })
    .await
}

/// Stop the running timer; `None` when nothing was running
pub async fn stop_timer(ctx: &AppContext) -> Result<Option<TimeEntry>> {
    instrument_command("timer::stop_timer", ctx.synchronizer.stop_timer()).await
}

/// Last timer seen by the poll loop, without a request
pub fn get_current_timer(ctx: &AppContext) -> Option<TimeEntry> {
    ctx.synchronizer.current_timer()
}

/// Poll the provider immediately
pub async fn refresh_timer(ctx: &AppContext) -> Result<TimerTransition> {
    instrument_command("timer::refresh_timer", ctx.synchronizer.poll_now()).await
}

/// Entries from the last few weeks, newest first
pub async fn get_recent_entries(ctx: &AppContext) -> Result<Vec<DetailedReportItem>> {
    instrument_command("timer::get_recent_entries", ctx.synchronizer.recent_time_entries()).await
}

fn entry_from_recent(item: &DetailedReportItem) -> NewTimeEntry {
    NewTimeEntry {
        description: item.description.clone(),
        project_id: item.project_id,
        tag_ids: item.tag_ids.clone(),
        billable: item.billable,
    }
}
