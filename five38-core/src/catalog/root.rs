//! Root catalog: one nested catalog per project

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::project::ProjectCatalog;
use super::{
    insert_unique, normalize_project_name, Catalog, CatalogHandle, CatalogSource, Entry,
    NameCollision,
};
use crate::cache::TtlCache;
use crate::config::RepositoryConfig;
use crate::error::{CatalogError, Result};
use crate::projects::{ProjectDescriptor, ProjectIndexer};
use crate::transport::Transport;
use crate::tree::{TreeFetcher, TreeSnapshot};

/// Name reported by every root catalog
pub const ROOT_CATALOG_NAME: &str = "projects";

/// Everything one load of the root catalog produces
struct RootState {
    snapshot: Arc<TreeSnapshot>,
    projects: Vec<ProjectDescriptor>,
    entries: BTreeMap<String, Entry>,
    collisions: Vec<NameCollision>,
}

/// Lazily-loaded collection of per-project catalogs
///
/// Constructing one does no I/O. The first read fetches the tree (unless a
/// snapshot was injected), indexes projects matching the query, and caches
/// the result for the configured TTL.
pub struct RootCatalog {
    config: Arc<RepositoryConfig>,
    transport: Arc<dyn Transport>,
    query: Option<String>,
    description: String,
    injected: Option<Arc<TreeSnapshot>>,
    cache: TtlCache<RootState>,
}

impl RootCatalog {
    pub fn new(
        config: Arc<RepositoryConfig>,
        transport: Arc<dyn Transport>,
        query: Option<String>,
    ) -> Self {
        let ttl = config.ttl();
        let description = format!("Projects published in {}", config.repository);

        Self {
            config,
            transport,
            query: query.filter(|q| !q.is_empty()),
            description,
            injected: None,
            cache: TtlCache::new(ttl),
        }
    }

    /// Use an already-fetched snapshot instead of fetching one on load
    pub fn with_snapshot(mut self, snapshot: Arc<TreeSnapshot>) -> Self {
        self.injected = Some(snapshot);
        self.cache.invalidate();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    /// A new catalog scoped to `keyword`; this one is left untouched
    pub fn search(&self, keyword: &str) -> RootCatalog {
        let mut catalog = RootCatalog::new(
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            Some(keyword.to_string()),
        );
        catalog.injected = self.injected.clone();
        if let Some(ttl) = self.cache.ttl() {
            catalog.cache = TtlCache::new(ttl);
        }
        catalog
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Descriptors of the matching projects, in snapshot order
    pub fn projects(&mut self) -> Result<&[ProjectDescriptor]> {
        Ok(&self.load()?.projects)
    }

    /// The snapshot the current entries were built from
    pub fn snapshot(&mut self) -> Result<Arc<TreeSnapshot>> {
        Ok(Arc::clone(&self.load()?.snapshot))
    }

    /// Projects whose normalized names clashed during the last load
    pub fn collisions(&mut self) -> Result<&[NameCollision]> {
        Ok(&self.load()?.collisions)
    }

    /// Instantiate the catalog of one project, by entry key or raw name
    pub fn project(&mut self, name: &str) -> Result<ProjectCatalog> {
        let config = Arc::clone(&self.config);
        let transport = Arc::clone(&self.transport);
        let state = self.load()?;

        let descriptor = state
            .projects
            .iter()
            .find(|p| p.name == name)
            .or_else(|| {
                state
                    .projects
                    .iter()
                    .find(|p| normalize_project_name(&p.name) == name)
            })
            .ok_or_else(|| CatalogError::UnknownEntry {
                name: name.to_string(),
            })?;

        Ok(ProjectCatalog::new(
            config,
            transport,
            descriptor.name.clone(),
            Some(Arc::clone(&state.snapshot)),
        )
        .with_description(descriptor.description.clone()))
    }

    /// Drop the cache and load again
    pub fn reload(&mut self) -> Result<&BTreeMap<String, Entry>> {
        self.cache.invalidate();
        self.entries()
    }

    fn load(&mut self) -> Result<&RootState> {
        let Self {
            config,
            transport,
            query,
            injected,
            cache,
            ..
        } = self;

        if let Some(age) = cache.age().filter(|_| cache.is_stale()) {
            tracing::debug!(
                "Project list for {} expired after {:?}; reloading",
                config.repository,
                age
            );
        }

        cache.load_if_stale(|| load_root(config, transport, query.as_deref(), injected.as_ref()))
    }
}

fn load_root(
    config: &Arc<RepositoryConfig>,
    transport: &Arc<dyn Transport>,
    query: Option<&str>,
    injected: Option<&Arc<TreeSnapshot>>,
) -> Result<RootState> {
    let snapshot = match injected {
        Some(snapshot) => Arc::clone(snapshot),
        None => TreeFetcher::new(config, &**transport).fetch_shared()?,
    };

    let projects =
        ProjectIndexer::new(config, &**transport).list_projects(&snapshot, query)?;

    let mut entries = BTreeMap::new();
    let mut collisions = Vec::new();

    for project in &projects {
        let source = ProjectSource {
            config: Arc::clone(config),
            transport: Arc::clone(transport),
            project: project.name.clone(),
            description: project.description.clone(),
            snapshot: Arc::clone(&snapshot),
        };
        let handle = CatalogHandle::new(&project.name, &project.description, source);

        insert_unique(
            &mut entries,
            &mut collisions,
            normalize_project_name(&project.name),
            Entry::Catalog(handle),
        );
    }

    tracing::info!(
        "Loaded {} project(s) from {}@{} (query: {:?})",
        entries.len(),
        config.repository,
        snapshot.sha,
        query
    );

    Ok(RootState {
        snapshot,
        projects,
        entries,
        collisions,
    })
}

/// Opens a project catalog over the shared snapshot; never expires
struct ProjectSource {
    config: Arc<RepositoryConfig>,
    transport: Arc<dyn Transport>,
    project: String,
    description: String,
    snapshot: Arc<TreeSnapshot>,
}

impl CatalogSource for ProjectSource {
    fn open(&self) -> Result<Box<dyn Catalog>> {
        let catalog = ProjectCatalog::new(
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            self.project.clone(),
            Some(Arc::clone(&self.snapshot)),
        )
        .with_description(self.description.clone());

        Ok(Box::new(catalog))
    }
}

impl Catalog for RootCatalog {
    fn name(&self) -> &str {
        ROOT_CATALOG_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn entries(&mut self) -> Result<&BTreeMap<String, Entry>> {
        Ok(&self.load()?.entries)
    }

    fn invalidate(&mut self) {
        self.cache.invalidate();
    }
}
