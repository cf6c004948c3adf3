//! Report queries, outbound report options and report payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::reference::{EnrichedProject, Tag};
use crate::impl_domain_status_conversions;

/// A project, client or tag referenced by name or identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterRef {
    Id(u64),
    Name(String),
}

impl From<u64> for FilterRef {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for FilterRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Include,
    /// Accepted in queries but never forwarded to the provider
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub mode: SelectionMode,
    pub list: Vec<FilterRef>,
}

impl Selection {
    pub fn include<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FilterRef>,
    {
        Self { mode: SelectionMode::Include, list: items.into_iter().map(Into::into).collect() }
    }
}

/// Immutable report request built by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub projects: Option<Selection>,
    #[serde(default)]
    pub clients: Option<Selection>,
    #[serde(default)]
    pub tags: Option<Vec<FilterRef>>,
}

impl ReportQuery {
    pub const fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to, projects: None, clients: None, tags: None }
    }

    #[must_use]
    pub fn with_projects(mut self, selection: Selection) -> Self {
        self.projects = Some(selection);
        self
    }

    #[must_use]
    pub fn with_clients(mut self, selection: Selection) -> Self {
        self.clients = Some(selection);
        self
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FilterRef>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Time-series bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeChartResolution {
    Day,
    Week,
    Month,
}

impl_domain_status_conversions!(TimeChartResolution {
    Day => "day",
    Week => "week",
    Month => "month",
});

/// Options sent to the provider's report endpoints
///
/// Filter dimensions that resolved to nothing are `None` and left out of the
/// request body entirely; an empty list would mean "entries without one".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<TimeChartResolution>,
}

impl ReportOptions {
    pub const fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            project_ids: None,
            client_ids: None,
            tag_ids: None,
            resolution: None,
        }
    }
}

/// One row of the daily per-project summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummaryItem {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub project_id: Option<u64>,
    pub tracked_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySubGroup {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    pub seconds: i64,
}

/// Summary group keyed by project (`id` is `None` for entries without one)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryGroup {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_groups: Vec<SummarySubGroup>,
}

impl SummaryGroup {
    pub fn seconds(&self) -> i64 {
        self.sub_groups.iter().map(|sub| sub.seconds).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeChartPoint {
    pub seconds: i64,
}

/// Totals with an undated time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeChart {
    pub seconds: i64,
    pub resolution: TimeChartResolution,
    #[serde(default, deserialize_with = "null_as_default")]
    pub graph: Vec<TimeChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedTimeChartPoint {
    pub date: NaiveDate,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedTimeChart {
    pub seconds: i64,
    pub resolution: TimeChartResolution,
    pub graph: Vec<DatedTimeChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedSummaryGroup {
    #[serde(flatten)]
    pub group: SummaryGroup,
    pub project: Option<EnrichedProject>,
}

/// Summary report: per-project totals plus a dated time chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub project_summary: Vec<EnrichedSummaryGroup>,
    pub time_chart: DatedTimeChart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTimeEntry {
    pub id: u64,
    pub seconds: i64,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
}

/// Grouped row of the detailed report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedReportItem {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_ids: Vec<u64>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_entries: Vec<ReportTimeEntry>,
    #[serde(default)]
    pub row_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedDetailedItem {
    #[serde(flatten)]
    pub item: DetailedReportItem,
    pub project: Option<EnrichedProject>,
    pub tags: Vec<Tag>,
}
