//! five38 Catalog - lazy two-level dataset catalog
//!
//! # Overview
//!
//! The catalog turns one repository snapshot into a browsable tree:
//! - `RootCatalog` has one entry per project (top-level directory)
//! - `ProjectCatalog` has one entry per CSV file inside that project
//! - `walk` flattens any catalog into dotted names
//!
//! # Architecture
//!
//! ```text
//! TreeFetcher ──► TreeSnapshot (Arc, read-only)
//!                      │
//!                      ├──► ProjectIndexer ──► RootCatalog
//!                      │                          │ Entry::Catalog (deferred)
//!                      └──────────────────────► ProjectCatalog
//!                                                 │ Entry::Source
//!                                                 ▼
//!                                        { driver: csv, urlpath }
//! ```

mod project;
mod root;
mod walk;

pub use project::ProjectCatalog;
pub use root::{RootCatalog, ROOT_CATALOG_NAME};
pub use walk::{walk, DEFAULT_WALK_DEPTH};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CatalogError, Result};

/// Driver name declared by every data source
pub const CSV_DRIVER: &str = "csv";

/// A catalog whose entries are loaded on first access
pub trait Catalog {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Loaded entries, keyed by normalized name.
    ///
    /// Loads on first access and again once the cached copy is stale.
    fn entries(&mut self) -> Result<&BTreeMap<String, Entry>>;

    /// Drop cached entries so the next access reloads
    fn invalidate(&mut self);

    /// Look up one entry by name
    fn get(&mut self, name: &str) -> Result<Entry> {
        self.entries()?
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownEntry {
                name: name.to_string(),
            })
    }

    /// Flatten this catalog and its nested catalogs into dotted names
    fn walk(&mut self, depth: usize) -> Result<BTreeMap<String, Entry>> {
        walk(self, depth)
    }
}

/// Something that can instantiate a nested catalog with default parameters
pub trait CatalogSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn Catalog>>;
}

/// Deferred reference to a nested catalog
#[derive(Clone)]
pub struct CatalogHandle {
    name: String,
    description: String,
    source: Arc<dyn CatalogSource>,
}

impl CatalogHandle {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: impl CatalogSource + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            source: Arc::new(source),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Instantiate the nested catalog. Its entries load on first access.
    pub fn open(&self) -> Result<Box<dyn Catalog>> {
        self.source.open()
    }
}

impl fmt::Debug for CatalogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A single loadable tabular file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSource {
    pub name: String,
    pub description: String,

    /// External driver that parses the file
    pub driver: String,

    /// Arguments handed to the driver
    pub args: BTreeMap<String, String>,

    /// Repository path the source was discovered at
    pub path: String,
}

impl DataSource {
    pub fn csv(
        name: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<String>,
        urlpath: impl Into<String>,
    ) -> Self {
        let mut args = BTreeMap::new();
        args.insert("urlpath".to_string(), urlpath.into());

        Self {
            name: name.into(),
            description: description.into(),
            driver: CSV_DRIVER.to_string(),
            args,
            path: path.into(),
        }
    }

    /// Raw content URL the driver reads from
    pub fn urlpath(&self) -> Option<&str> {
        self.args.get("urlpath").map(String::as_str)
    }

    /// Description handed to the external loader
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "driver": self.driver,
            "args": self.args,
            "container": "dataframe",
        })
    }
}

/// A catalog entry: either a leaf data source or a nested catalog
#[derive(Debug, Clone)]
pub enum Entry {
    Source(DataSource),
    Catalog(CatalogHandle),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Source(source) => &source.name,
            Entry::Catalog(handle) => handle.name(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Entry::Source(source) => &source.description,
            Entry::Catalog(handle) => handle.description(),
        }
    }

    pub fn is_catalog(&self) -> bool {
        matches!(self, Entry::Catalog(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Source(_) => "source",
            Entry::Catalog(_) => "catalog",
        }
    }

    pub fn as_source(&self) -> Option<&DataSource> {
        match self {
            Entry::Source(source) => Some(source),
            Entry::Catalog(_) => None,
        }
    }

    pub fn as_catalog(&self) -> Option<&CatalogHandle> {
        match self {
            Entry::Catalog(handle) => Some(handle),
            Entry::Source(_) => None,
        }
    }

    pub fn describe(&self) -> serde_json::Value {
        match self {
            Entry::Source(source) => source.describe(),
            Entry::Catalog(handle) => serde_json::json!({
                "name": handle.name(),
                "description": handle.description(),
                "container": "catalog",
            }),
        }
    }

    /// What the entry was built from: a file path or a project name
    fn origin(&self) -> &str {
        match self {
            Entry::Source(source) => &source.path,
            Entry::Catalog(handle) => handle.name(),
        }
    }
}

/// Two distinct origins that normalized to the same entry name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub name: String,
    /// Origin of the entry that was kept
    pub kept: String,
    /// Origin of the entry that was not registered
    pub dropped: String,
}

/// Project directory name as an accessor key
pub fn normalize_project_name(project: &str) -> String {
    project.replace('-', "_")
}

/// Entry name for a file: project prefix and `.csv` stripped, separators to `_`
///
/// Dots are separators too, since walked names use `.` between levels.
pub fn normalize_source_name(project: &str, path: &str) -> String {
    let relative = path
        .strip_prefix(project)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path);

    let stem = match relative.len().checked_sub(4) {
        Some(cut)
            if relative.is_char_boundary(cut)
                && relative[cut..].eq_ignore_ascii_case(".csv") =>
        {
            &relative[..cut]
        }
        _ => relative,
    };

    stem.replace(['-', '/', ' ', '.'], "_")
}

/// Register `entry` under `key` unless the name is taken; first one wins
pub(crate) fn insert_unique(
    entries: &mut BTreeMap<String, Entry>,
    collisions: &mut Vec<NameCollision>,
    key: String,
    entry: Entry,
) {
    if let Some(existing) = entries.get(&key) {
        tracing::warn!(
            "Entry name '{}' from '{}' collides with '{}'; keeping the first",
            key,
            entry.origin(),
            existing.origin()
        );
        collisions.push(NameCollision {
            name: key,
            kept: existing.origin().to_string(),
            dropped: entry.origin().to_string(),
        });
        return;
    }

    entries.insert(key, entry);
}
