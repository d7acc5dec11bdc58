//! Repository tree snapshots
//!
//! A snapshot is the full recursive listing of the repository at one commit,
//! fetched once and shared read-only by every catalog built from it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::transport::{get_json, Transport};

/// Kind of a node in a git tree listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Directory
    Tree,
    /// File
    Blob,
    /// Submodule pointer
    Commit,
}

/// One entry of a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Slash-separated repository-relative path
    pub path: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Object id
    #[serde(default)]
    pub sha: Option<String>,

    /// Size in bytes (blobs only)
    #[serde(default)]
    pub size: Option<u64>,

    /// API URL the object can be refetched from
    #[serde(default)]
    pub url: Option<String>,
}

impl TreeNode {
    pub fn tree(path: impl Into<String>) -> Self {
        Self::new(path, NodeType::Tree)
    }

    pub fn blob(path: impl Into<String>) -> Self {
        Self::new(path, NodeType::Blob)
    }

    fn new(path: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            path: path.into(),
            node_type,
            sha: None,
            size: None,
            url: None,
        }
    }

    pub fn is_tree(&self) -> bool {
        self.node_type == NodeType::Tree
    }

    pub fn is_blob(&self) -> bool {
        self.node_type == NodeType::Blob
    }

    /// Directory directly under the repository root
    pub fn is_top_level_tree(&self) -> bool {
        self.is_tree() && !self.path.contains('/')
    }
}

/// The complete file listing of the repository at one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Commit (tree) id every URL built from this snapshot is pinned to
    pub sha: String,

    pub tree: Vec<TreeNode>,

    /// Set by the host when the listing was cut short
    #[serde(default)]
    pub truncated: bool,
}

impl TreeSnapshot {
    pub fn new(sha: impl Into<String>, tree: Vec<TreeNode>) -> Self {
        Self {
            sha: sha.into(),
            tree,
            truncated: false,
        }
    }

    /// Top-level directories, in listing order
    pub fn top_level_trees(&self) -> impl Iterator<Item = &TreeNode> {
        self.tree.iter().filter(|node| node.is_top_level_tree())
    }

    /// Files whose path starts with `<dir>/`
    pub fn blobs_under<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a TreeNode> + 'a {
        let prefix = format!("{dir}/");
        self.tree
            .iter()
            .filter(move |node| node.is_blob() && node.path.starts_with(&prefix))
    }

    pub fn contains_tree(&self, path: &str) -> bool {
        self.tree.iter().any(|node| node.is_tree() && node.path == path)
    }
}

#[derive(Deserialize)]
struct RepoMetadata {
    default_branch: String,
}

#[derive(Deserialize)]
struct BranchMetadata {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

/// Resolves the default branch and fetches its full tree
pub struct TreeFetcher<'a> {
    config: &'a RepositoryConfig,
    transport: &'a dyn Transport,
}

impl<'a> TreeFetcher<'a> {
    pub fn new(config: &'a RepositoryConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// Repository metadata, then default-branch metadata, then the recursive tree.
    ///
    /// No retry and no caching: every call issues all three requests.
    pub fn fetch_default_tree(&self) -> Result<TreeSnapshot> {
        let repo: RepoMetadata = get_json(self.transport, &self.config.repo_api_url())?;

        let branch: BranchMetadata = get_json(
            self.transport,
            &self.config.branch_api_url(&repo.default_branch),
        )?;

        let snapshot: TreeSnapshot =
            get_json(self.transport, &self.config.tree_api_url(&branch.commit.sha))?;

        if snapshot.truncated {
            tracing::warn!(
                "Tree for {}@{} was truncated by the host ({} nodes returned)",
                self.config.repository,
                snapshot.sha,
                snapshot.tree.len()
            );
        }

        tracing::debug!(
            "Fetched tree for {} ({} @ {}): {} nodes",
            self.config.repository,
            repo.default_branch,
            snapshot.sha,
            snapshot.tree.len()
        );

        Ok(snapshot)
    }

    /// Same as `fetch_default_tree`, wrapped for sharing
    pub fn fetch_shared(&self) -> Result<Arc<TreeSnapshot>> {
        self.fetch_default_tree().map(Arc::new)
    }
}

#[cfg(test)]
mod tree_tests {
    use super::*;

    #[test]
    fn test_parse_tree_listing() {
        let json = r#"{
            "sha": "abc123",
            "url": "https://api.github.com/repos/fivethirtyeight/data/git/trees/abc123",
            "tree": [
                {"path": "elections", "mode": "040000", "type": "tree", "sha": "t1"},
                {"path": "elections/README.md", "mode": "100644", "type": "blob", "sha": "b1", "size": 120},
                {"path": "vendored", "mode": "160000", "type": "commit", "sha": "c1"}
            ],
            "truncated": false
        }"#;

        let snapshot: TreeSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.sha, "abc123");
        assert_eq!(snapshot.tree.len(), 3);
        assert_eq!(snapshot.tree[1].size, Some(120));
        assert_eq!(snapshot.tree[2].node_type, NodeType::Commit);
    }

    #[test]
    fn test_top_level_trees() {
        let snapshot = TreeSnapshot::new(
            "abc123",
            vec![
                TreeNode::tree("elections"),
                TreeNode::tree("elections/2016"),
                TreeNode::blob("README.md"),
                TreeNode::tree("polls"),
            ],
        );

        let names: Vec<_> = snapshot.top_level_trees().map(|n| n.path.as_str()).collect();
        assert_eq!(names, vec!["elections", "polls"]);
        assert!(snapshot.contains_tree("elections/2016"));
        assert!(!snapshot.contains_tree("README.md"));
    }

    #[test]
    fn test_blobs_under_requires_directory_boundary() {
        let snapshot = TreeSnapshot::new(
            "abc123",
            vec![
                TreeNode::tree("polls"),
                TreeNode::blob("polls/a.csv"),
                TreeNode::tree("polls-2020"),
                TreeNode::blob("polls-2020/b.csv"),
            ],
        );

        let paths: Vec<_> = snapshot.blobs_under("polls").map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["polls/a.csv"]);
    }
}
