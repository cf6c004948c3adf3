//! Summary and detailed reports built from a [`ReportQuery`]
//!
//! Filter names are resolved through the reference lookup before anything is
//! sent. A dimension that resolves to no identifiers is left out of the
//! request, since the provider reads an empty list as "entries without one".

pub mod service;

use chrono::{Days, Months, NaiveDate};
use tickbridge_domain::{
    DatedTimeChart, DatedTimeChartPoint, FilterRef, ReportOptions, ReportQuery, Selection,
    SelectionMode, TimeChart, TimeChartResolution,
};

use crate::reference::ReferenceLookup;

pub use service::ReportService;

/// Bucket size for a report spanning `from..=to`
pub fn chart_resolution(from: NaiveDate, to: NaiveDate) -> TimeChartResolution {
    match (to - from).num_days() {
        days if days <= 31 => TimeChartResolution::Day,
        days if days <= 120 => TimeChartResolution::Week,
        _ => TimeChartResolution::Month,
    }
}

/// Dates of the first `count` buckets starting at `from`
pub fn bucket_dates(
    from: NaiveDate,
    resolution: TimeChartResolution,
    count: usize,
) -> Vec<NaiveDate> {
    (0..count)
        .map_while(|i| {
            let step = u32::try_from(i).ok()?;
            match resolution {
                TimeChartResolution::Day => from.checked_add_days(Days::new(step.into())),
                TimeChartResolution::Week => from.checked_add_days(Days::new(u64::from(step) * 7)),
                TimeChartResolution::Month => from.checked_add_months(Months::new(step)),
            }
        })
        .collect()
}

/// Attach bucket dates to an undated chart
pub fn date_chart(from: NaiveDate, chart: TimeChart) -> DatedTimeChart {
    let dates = bucket_dates(from, chart.resolution, chart.graph.len());
    let graph = chart
        .graph
        .into_iter()
        .zip(dates)
        .map(|(point, date)| DatedTimeChartPoint { date, seconds: point.seconds })
        .collect();
    DatedTimeChart { seconds: chart.seconds, resolution: chart.resolution, graph }
}

fn non_empty(ids: Vec<u64>) -> Option<Vec<u64>> {
    (!ids.is_empty()).then_some(ids)
}

fn included<'a>(selection: Option<&'a Selection>) -> Option<&'a [FilterRef]> {
    selection.filter(|s| s.mode == SelectionMode::Include).map(|s| s.list.as_slice())
}

/// Outbound options for `query` without a chart resolution
pub fn resolve_filters(query: &ReportQuery, lookup: &dyn ReferenceLookup) -> ReportOptions {
    ReportOptions {
        project_ids: included(query.projects.as_ref())
            .and_then(|refs| non_empty(lookup.project_ids(refs))),
        client_ids: included(query.clients.as_ref())
            .and_then(|refs| non_empty(lookup.client_ids(refs))),
        tag_ids: query.tags.as_deref().and_then(|refs| non_empty(lookup.tag_ids(refs))),
        ..ReportOptions::between(query.from, query.to)
    }
}
