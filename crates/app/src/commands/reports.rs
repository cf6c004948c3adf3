//! Report and reference data commands

use tickbridge_core::ReferenceLookup;
use tickbridge_domain::{
    EnrichedDetailedItem, EnrichedProject, ReportQuery, Result, SummaryReport, Tag,
};

use crate::utils::logging::instrument_command;
use crate::AppContext;

/// Per-project summary with a dated time chart
pub async fn get_summary_report(ctx: &AppContext, query: &ReportQuery) -> Result<SummaryReport> {
    instrument_command("reports::get_summary_report", ctx.synchronizer.summary_report(query)).await
}

/// Detailed rows joined with project, client and tags
pub async fn get_detailed_report(
    ctx: &AppContext,
    query: &ReportQuery,
) -> Result<Vec<EnrichedDetailedItem>> {
    instrument_command("reports::get_detailed_report", ctx.synchronizer.detailed_report(query))
        .await
}

/// Cached projects of the selected workspace with their clients
pub fn get_projects(ctx: &AppContext) -> Vec<EnrichedProject> {
    ctx.references
        .projects()
        .into_iter()
        .filter_map(|project| ctx.references.enrich_project(project.id))
        .collect()
}

/// Cached tags of the selected workspace
pub fn get_tags(ctx: &AppContext) -> Vec<Tag> {
    ctx.references.tags()
}
