//! Reference data: projects, clients and tags of the selected workspace

pub mod store;

use tickbridge_domain::{Client, EnrichedProject, FilterRef, Project, Tag};

pub use store::ReferenceStore;

/// Name resolution and enrichment over cached reference data
///
/// Lookups never hit the provider; they only see whatever the last preload
/// stored.
pub trait ReferenceLookup: Send + Sync {
    /// Identifiers for `refs`: ids pass through, names match case-insensitively,
    /// unknown names are dropped
    fn project_ids(&self, refs: &[FilterRef]) -> Vec<u64>;

    fn client_ids(&self, refs: &[FilterRef]) -> Vec<u64>;

    fn tag_ids(&self, refs: &[FilterRef]) -> Vec<u64>;

    /// Project joined with its client
    fn enrich_project(&self, project_id: u64) -> Option<EnrichedProject>;

    /// Tags whose identifiers appear in `tag_ids`
    fn tags_by_ids(&self, tag_ids: &[u64]) -> Vec<Tag>;

    /// Replace the projects collection wholesale
    fn replace_projects(&self, projects: Vec<Project>);

    fn replace_clients(&self, clients: Vec<Client>);

    fn replace_tags(&self, tags: Vec<Tag>);
}
