//! In-memory reference data store

use parking_lot::RwLock;
use tickbridge_domain::{Client, EnrichedProject, FilterRef, Project, Tag};
use tracing::debug;

use super::ReferenceLookup;

/// Cached projects, clients and tags, replaced wholesale on every preload
#[derive(Debug, Default)]
pub struct ReferenceStore {
    projects: RwLock<Vec<Project>>,
    clients: RwLock<Vec<Client>>,
    tags: RwLock<Vec<Tag>>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.projects.read().clone()
    }

    pub fn clients(&self) -> Vec<Client> {
        self.clients.read().clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.read().clone()
    }
}

/// Case-insensitive name comparison with full Unicode lowercasing
fn same_name(stored: &str, wanted: &str) -> bool {
    stored == wanted || stored.to_lowercase() == wanted.to_lowercase()
}

fn resolve<T>(
    items: &[T],
    refs: &[FilterRef],
    id: impl Fn(&T) -> u64,
    name: impl Fn(&T) -> &str,
) -> Vec<u64> {
    refs.iter()
        .filter_map(|filter| match filter {
            FilterRef::Id(value) => Some(*value),
            FilterRef::Name(wanted) => {
                let wanted = wanted.trim();
                let found = items.iter().find(|item| same_name(name(item), wanted)).map(&id);
                if found.is_none() {
                    debug!(name = wanted, "Dropping unknown reference name from filter");
                }
                found
            }
        })
        .collect()
}

impl ReferenceLookup for ReferenceStore {
    fn project_ids(&self, refs: &[FilterRef]) -> Vec<u64> {
        resolve(&self.projects.read(), refs, |p| p.id, |p| &p.name)
    }

    fn client_ids(&self, refs: &[FilterRef]) -> Vec<u64> {
        resolve(&self.clients.read(), refs, |c| c.id, |c| &c.name)
    }

    fn tag_ids(&self, refs: &[FilterRef]) -> Vec<u64> {
        resolve(&self.tags.read(), refs, |t| t.id, |t| &t.name)
    }

    fn enrich_project(&self, project_id: u64) -> Option<EnrichedProject> {
        let project = self.projects.read().iter().find(|p| p.id == project_id).cloned()?;
        let client = project.client_id.and_then(|client_id| {
            self.clients.read().iter().find(|c| c.id == client_id).cloned()
        });
        Some(EnrichedProject { project, client })
    }

    fn tags_by_ids(&self, tag_ids: &[u64]) -> Vec<Tag> {
        self.tags.read().iter().filter(|tag| tag_ids.contains(&tag.id)).cloned().collect()
    }

    fn replace_projects(&self, projects: Vec<Project>) {
        *self.projects.write() = projects;
    }

    fn replace_clients(&self, clients: Vec<Client>) {
        *self.clients.write() = clients;
    }

    fn replace_tags(&self, tags: Vec<Tag>) {
        *self.tags.write() = tags;
    }
}
