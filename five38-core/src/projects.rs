//! Project discovery
//!
//! Projects are the top-level directories of the repository. Each one is
//! described by the README inside it.

use serde::{Deserialize, Serialize};

use crate::config::RepositoryConfig;
use crate::error::{CatalogError, Result};
use crate::transport::Transport;
use crate::tree::{TreeNode, TreeSnapshot};

/// A discovered project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Directory name (no path separator)
    pub name: String,

    /// Raw README text
    pub description: String,

    /// Browsable link to the directory at the snapshot commit
    pub url: String,
}

impl ProjectDescriptor {
    /// First Markdown heading of the README, or its first non-empty line
    pub fn title(&self) -> &str {
        let mut lines = self.description.lines().map(str::trim).filter(|l| !l.is_empty());

        let first = match lines.next() {
            Some(line) => line,
            None => return "",
        };

        std::iter::once(first)
            .chain(lines)
            .find(|line| line.starts_with('#'))
            .map(|line| line.trim_start_matches('#').trim())
            .unwrap_or(first)
    }
}

/// Builds project descriptors from a snapshot
pub struct ProjectIndexer<'a> {
    config: &'a RepositoryConfig,
    transport: &'a dyn Transport,
}

impl<'a> ProjectIndexer<'a> {
    pub fn new(config: &'a RepositoryConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// List the projects whose name contains `keyword`, in snapshot order.
    ///
    /// An empty or absent keyword keeps every project. Matching is a
    /// case-sensitive substring test. Fetches one README per project.
    pub fn list_projects(
        &self,
        snapshot: &TreeSnapshot,
        keyword: Option<&str>,
    ) -> Result<Vec<ProjectDescriptor>> {
        let keyword = keyword.filter(|k| !k.is_empty());

        let candidates: Vec<&TreeNode> = snapshot
            .top_level_trees()
            .filter(|node| keyword.is_none_or(|k| node.path.contains(k)))
            .collect();

        tracing::debug!(
            "{} project(s) match {:?} in {}@{}",
            candidates.len(),
            keyword,
            self.config.repository,
            snapshot.sha
        );

        candidates
            .into_iter()
            .map(|node| self.describe(snapshot, &node.path))
            .collect()
    }

    fn describe(&self, snapshot: &TreeSnapshot, project: &str) -> Result<ProjectDescriptor> {
        let readme = find_readme(snapshot, project).ok_or_else(|| {
            CatalogError::DocumentationMissing {
                project: project.to_string(),
            }
        })?;

        let description = self
            .transport
            .get_text(&self.config.raw_file_url(&snapshot.sha, &readme.path))?;

        Ok(ProjectDescriptor {
            name: project.to_string(),
            description,
            url: self.config.browse_url(&snapshot.sha, project),
        })
    }
}

/// First file under the project whose name ends in `readme.md`, any case
pub fn find_readme<'a>(snapshot: &'a TreeSnapshot, project: &str) -> Option<&'a TreeNode> {
    snapshot
        .blobs_under(project)
        .find(|node| node.path.to_lowercase().ends_with("readme.md"))
}

#[cfg(test)]
mod projects_tests {
    use super::*;

    fn descriptor(description: &str) -> ProjectDescriptor {
        ProjectDescriptor {
            name: "elections".to_string(),
            description: description.to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn test_title_prefers_heading() {
        let d = descriptor("\n\n# Election Results\n\nData behind the story.\n");
        assert_eq!(d.title(), "Election Results");

        let d = descriptor("Intro text\n\n### Polls\n");
        assert_eq!(d.title(), "Polls");
    }

    #[test]
    fn test_title_falls_back_to_first_line() {
        let d = descriptor("  Data behind the story  \nmore\n");
        assert_eq!(d.title(), "Data behind the story");

        assert_eq!(descriptor("").title(), "");
    }

    #[test]
    fn test_find_readme_any_case() {
        let snapshot = TreeSnapshot::new(
            "abc123",
            vec![
                TreeNode::tree("polls"),
                TreeNode::blob("polls/data.csv"),
                TreeNode::blob("polls/Readme.MD"),
                TreeNode::blob("polls/sub/README.md"),
            ],
        );

        let readme = find_readme(&snapshot, "polls").unwrap();
        assert_eq!(readme.path, "polls/Readme.MD");
    }

    #[test]
    fn test_find_readme_ignores_sibling_prefix() {
        let snapshot = TreeSnapshot::new(
            "abc123",
            vec![
                TreeNode::tree("polls"),
                TreeNode::tree("polls-2020"),
                TreeNode::blob("polls-2020/README.md"),
            ],
        );

        assert!(find_readme(&snapshot, "polls").is_none());
        assert!(find_readme(&snapshot, "polls-2020").is_some());
    }
}
