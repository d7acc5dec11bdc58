//! Project catalog: the CSV files of one project directory

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{insert_unique, normalize_source_name, Catalog, DataSource, Entry, NameCollision};
use crate::cache::TtlCache;
use crate::config::RepositoryConfig;
use crate::error::{CatalogError, Result};
use crate::transport::Transport;
use crate::tree::{TreeFetcher, TreeSnapshot};

struct ProjectState {
    entries: BTreeMap<String, Entry>,
    collisions: Vec<NameCollision>,
}

/// Lazily-built set of data sources belonging to one project
///
/// Without an injected snapshot the first load fetches its own tree, which
/// costs the same three requests the root catalog already made. Catalogs
/// handed out by `RootCatalog` always share its snapshot.
pub struct ProjectCatalog {
    config: Arc<RepositoryConfig>,
    transport: Arc<dyn Transport>,
    project: String,
    description: String,
    snapshot: Option<Arc<TreeSnapshot>>,
    cache: TtlCache<ProjectState>,
}

impl ProjectCatalog {
    pub fn new(
        config: Arc<RepositoryConfig>,
        transport: Arc<dyn Transport>,
        project: impl Into<String>,
        snapshot: Option<Arc<TreeSnapshot>>,
    ) -> Self {
        Self {
            config,
            transport,
            project: project.into(),
            description: String::new(),
            snapshot,
            cache: TtlCache::forever(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    /// A fresh, unloaded catalog for the same project.
    ///
    /// The keyword is accepted so both catalog levels share a signature but it
    /// does not filter anything: every CSV of the project is listed.
    pub fn search(&self, _keyword: &str) -> ProjectCatalog {
        ProjectCatalog {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            project: self.project.clone(),
            description: self.description.clone(),
            snapshot: self.snapshot.clone(),
            cache: match self.cache.ttl() {
                Some(ttl) => TtlCache::new(ttl),
                None => TtlCache::forever(),
            },
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Snapshot in use, if one was injected or already fetched
    pub fn snapshot(&self) -> Option<&Arc<TreeSnapshot>> {
        self.snapshot.as_ref()
    }

    /// The data source registered under `name`
    pub fn source(&mut self, name: &str) -> Result<&DataSource> {
        self.load()?
            .entries
            .get(name)
            .and_then(Entry::as_source)
            .ok_or_else(|| CatalogError::UnknownEntry {
                name: name.to_string(),
            })
    }

    /// Files whose normalized names clashed during the last load
    pub fn collisions(&mut self) -> Result<&[NameCollision]> {
        Ok(&self.load()?.collisions)
    }

    fn load(&mut self) -> Result<&ProjectState> {
        let Self {
            config,
            transport,
            project,
            snapshot,
            cache,
            ..
        } = self;

        cache.load_if_stale(|| {
            let tree = match snapshot.as_ref() {
                Some(tree) => Arc::clone(tree),
                None => {
                    let fetched = TreeFetcher::new(config, &**transport).fetch_shared()?;
                    *snapshot = Some(Arc::clone(&fetched));
                    fetched
                }
            };

            Ok(scan_sources(config, project, &tree))
        })
    }
}

/// Every blob under `<project>/` ending in `.csv`, any case
fn scan_sources(
    config: &RepositoryConfig,
    project: &str,
    snapshot: &TreeSnapshot,
) -> ProjectState {
    let mut entries = BTreeMap::new();
    let mut collisions = Vec::new();
    let description = format!("data file for {project}");

    for node in snapshot
        .blobs_under(project)
        .filter(|node| node.path.to_lowercase().ends_with(".csv"))
    {
        let name = normalize_source_name(project, &node.path);
        let source = DataSource::csv(
            name.clone(),
            description.clone(),
            node.path.clone(),
            config.raw_file_url(&snapshot.sha, &node.path),
        );

        insert_unique(&mut entries, &mut collisions, name, Entry::Source(source));
    }

    tracing::debug!(
        "Project '{}' has {} data source(s) at {}",
        project,
        entries.len(),
        snapshot.sha
    );

    ProjectState {
        entries,
        collisions,
    }
}

impl Catalog for ProjectCatalog {
    fn name(&self) -> &str {
        &self.project
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
