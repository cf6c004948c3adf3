//! Data types exchanged between the gateway, the synchronizer and observers

pub mod reference;
pub mod report;
pub mod status;
pub mod timer;

use serde::{Deserialize, Deserializer};

pub use reference::{Client, EnrichedProject, Project, Tag, Workspace};
pub use report::{
    DatedTimeChart, DatedTimeChartPoint, DetailedReportItem, EnrichedDetailedItem,
    EnrichedSummaryGroup, FilterRef, ProjectSummaryItem, ReportOptions, ReportQuery,
    ReportTimeEntry, Selection, SelectionMode, SummaryGroup, SummaryReport, SummarySubGroup,
    TimeChart, TimeChartPoint, TimeChartResolution,
};
pub use status::{ApiStatus, Notice, NoticeKind};
pub use timer::{same_tags, NewTimeEntry, StartTimeEntry, TimeEntry, TimerTransition};

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
