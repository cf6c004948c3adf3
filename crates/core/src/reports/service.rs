//! Report retrieval and enrichment

use std::sync::Arc;

use tickbridge_domain::{
    EnrichedDetailedItem, EnrichedSummaryGroup, ReportQuery, Result, SummaryReport,
};
use tracing::{debug, instrument};

use super::{chart_resolution, date_chart, resolve_filters};
use crate::gateway::RequestGateway;
use crate::reference::ReferenceLookup;

/// Builds enriched reports on top of the gateway's report reads
pub struct ReportService {
    gateway: Arc<RequestGateway>,
    lookup: Arc<dyn ReferenceLookup>,
}

impl ReportService {
    pub fn new(gateway: Arc<RequestGateway>, lookup: Arc<dyn ReferenceLookup>) -> Self {
        Self { gateway, lookup }
    }

    /// Project summary and dated time chart for `query`
    ///
    /// Both halves are requested concurrently and each consumes quota.
    #[instrument(skip(self, query), fields(from = %query.from, to = %query.to))]
    pub async fn summary_report(&self, query: &ReportQuery) -> Result<SummaryReport> {
        let mut options = resolve_filters(query, self.lookup.as_ref());
        options.resolution = Some(chart_resolution(query.from, query.to));

        let (chart, groups) = tokio::try_join!(
            self.gateway.summary_time_chart(&options),
            self.gateway.summary(&options)
        )?;
        debug!(groups = groups.len(), points = chart.graph.len(), "Summary report fetched");

        let project_summary = groups
            .into_iter()
            .map(|group| EnrichedSummaryGroup {
                project: group.id.and_then(|id| self.lookup.enrich_project(id)),
                group,
            })
            .collect();

        Ok(SummaryReport { project_summary, time_chart: date_chart(query.from, chart) })
    }

    /// Every detailed row for `query`, with project and tags attached
    #[instrument(skip(self, query), fields(from = %query.from, to = %query.to))]
    pub async fn detailed_report(&self, query: &ReportQuery) -> Result<Vec<EnrichedDetailedItem>> {
        let options = resolve_filters(query, self.lookup.as_ref());
        let items = self.gateway.detailed_report(&options).await?;

        Ok(items
            .into_iter()
            .map(|item| EnrichedDetailedItem {
                project: item.project_id.and_then(|id| self.lookup.enrich_project(id)),
                tags: self.lookup.tags_by_ids(&item.tag_ids),
                item,
            })
            .collect())
    }
}
