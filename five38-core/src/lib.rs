//! five38 library exports
//!
//! Discovers the dataset projects published in one GitHub repository and
//! exposes them as a lazily-loaded two-level catalog of CSV data sources.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod projects;
pub mod transport;
pub mod tree;

pub use catalog::{
    walk, Catalog, CatalogHandle, CatalogSource, DataSource, Entry, NameCollision,
    ProjectCatalog, RootCatalog, DEFAULT_WALK_DEPTH,
};
pub use config::RepositoryConfig;
pub use error::{CatalogError, Result, UpstreamError};
pub use projects::{ProjectDescriptor, ProjectIndexer};
pub use transport::{HttpTransport, Transport};
pub use tree::{NodeType, TreeFetcher, TreeNode, TreeSnapshot};
