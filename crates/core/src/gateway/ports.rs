//! Port interfaces for reaching the tracking provider
//!
//! The gateway owns rate limiting and failure classification; these traits
//! only move requests over the wire.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tickbridge_domain::{
    Client, DetailedReportItem, Project, ProjectSummaryItem, ReportOptions, Result,
    StartTimeEntry, SummaryGroup, Tag, TimeChart, TimeEntry, Workspace,
};

/// Row layout requested from the detailed report endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetailLayout {
    /// Group identical entries into one row
    pub grouped: bool,
    /// Order rows by date, newest first
    pub newest_first: bool,
}

/// Authenticated connection to the tracking provider
#[async_trait]
pub trait TrackingTransport: Send + Sync {
    async fn workspaces(&self) -> Result<Vec<Workspace>>;

    async fn clients(&self, workspace_id: u64) -> Result<Vec<Client>>;

    /// All projects, archived ones included
    async fn projects(&self, workspace_id: u64) -> Result<Vec<Project>>;

    async fn tags(&self, workspace_id: u64) -> Result<Vec<Tag>>;

    async fn current_time_entry(&self) -> Result<Option<TimeEntry>>;

    async fn start_time_entry(&self, request: &StartTimeEntry) -> Result<TimeEntry>;

    async fn stop_time_entry(&self, workspace_id: u64, entry_id: u64) -> Result<TimeEntry>;

    /// Per-project tracked time from `start_date` onwards
    async fn projects_summary(
        &self,
        workspace_id: u64,
        start_date: NaiveDate,
    ) -> Result<Vec<ProjectSummaryItem>>;

    /// Summary grouped by project with time-entry sub-groups
    async fn summary(&self, workspace_id: u64, options: &ReportOptions)
        -> Result<Vec<SummaryGroup>>;

    /// Totals with a time series at `options.resolution`
    async fn totals(&self, workspace_id: u64, options: &ReportOptions) -> Result<TimeChart>;

    /// Every page of the detailed report, combined
    async fn detailed_report(
        &self,
        workspace_id: u64,
        options: &ReportOptions,
        layout: DetailLayout,
    ) -> Result<Vec<DetailedReportItem>>;
}

/// Builds a transport bound to an API token
pub trait TransportFactory: Send + Sync {
    fn create(&self, token: &str) -> Result<Arc<dyn TrackingTransport>>;
}

/// Minimal reachability check independent of the primary transport
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Succeeds when the provider's identity endpoint answers 2xx
    async fn probe(&self, token: &str) -> Result<()>;
}
