//! Test helper functions for integration tests
//!
//! Shared across the test files using the tests/common/ pattern. Provides an
//! in-memory `Transport` that serves canned responses and records every
//! request, plus builders for synthetic repositories.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use five38_core::error::{Result, UpstreamError};
use five38_core::{RepositoryConfig, Transport, TreeNode, TreeSnapshot};

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Config pointing at hosts that only exist inside `MockTransport`
pub fn test_config() -> RepositoryConfig {
    RepositoryConfig {
        repository: "owner/data".to_string(),
        api_url: "https://api.test".to_string(),
        raw_url: "https://raw.test".to_string(),
        web_url: "https://web.test".to_string(),
        ..RepositoryConfig::default()
    }
}

enum Canned {
    Body(String),
    Status(u16),
}

/// In-memory transport; unknown URLs answer 404
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.set(url.into(), Canned::Body(body.into()));
        self
    }

    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.set(url.into(), Canned::Status(status));
        self
    }

    /// Serve `snapshot` as the default branch of `config.repository`
    pub fn with_repository(self, config: &RepositoryConfig, snapshot: &TreeSnapshot) -> Self {
        let repo = serde_json::json!({
            "full_name": config.repository,
            "default_branch": "master",
        });
        let branch = serde_json::json!({
            "name": "master",
            "commit": { "sha": snapshot.sha },
        });

        self.with_body(config.repo_api_url(), repo.to_string())
            .with_body(config.branch_api_url("master"), branch.to_string())
            .with_body(
                config.tree_api_url(&snapshot.sha),
                serde_json::to_string(snapshot).unwrap(),
            )
    }

    /// Serve `body` as the raw content of `path` at the snapshot commit
    pub fn with_file(
        self,
        config: &RepositoryConfig,
        snapshot: &TreeSnapshot,
        path: &str,
        body: &str,
    ) -> Self {
        self.with_body(config.raw_file_url(&snapshot.sha, path), body)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn count_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    fn set(&self, url: String, canned: Canned) {
        self.responses.lock().unwrap().insert(url, canned);
    }
}

impl Transport for MockTransport {
    fn get_text(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());

        match self.responses.lock().unwrap().get(url) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(UpstreamError::Status {
                url: url.to_string(),
                status: *status,
            }
            .into()),
            None => Err(UpstreamError::Status {
                url: url.to_string(),
                status: 404,
            }
            .into()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// The single-project repository used across scenarios
pub fn elections_snapshot() -> TreeSnapshot {
    TreeSnapshot::new(
        "abc123",
        vec![
            TreeNode::tree("elections"),
            TreeNode::blob("elections/README.md"),
            TreeNode::blob("elections/results.csv"),
        ],
    )
}

pub const ELECTIONS_README: &str = "# Elections\n\nResults behind the forecast.\n";

/// A repository with several projects, nested files, and noise
pub fn multi_project_snapshot() -> TreeSnapshot {
    TreeSnapshot::new(
        "def456",
        vec![
            TreeNode::blob("README.md"),
            TreeNode::tree("college-majors"),
            TreeNode::blob("college-majors/README.md"),
            TreeNode::blob("college-majors/all-ages.csv"),
            TreeNode::blob("college-majors/recent-grads.csv"),
            TreeNode::tree("college-majors/raw"),
            TreeNode::blob("college-majors/raw/majors-list.CSV"),
            TreeNode::blob("college-majors/notes.txt"),
            TreeNode::tree("polls"),
            TreeNode::blob("polls/readme.md"),
            TreeNode::blob("polls/polls.csv"),
            TreeNode::tree("poll-quiz-guns"),
            TreeNode::blob("poll-quiz-guns/README.md"),
            TreeNode::blob("poll-quiz-guns/guns-polls.csv"),
        ],
    )
}

/// Transport serving `snapshot` and a README for every top-level project
pub fn serve_with_readmes(config: &RepositoryConfig, snapshot: &TreeSnapshot) -> MockTransport {
    let mut transport = MockTransport::new().with_repository(config, snapshot);

    for project in snapshot.top_level_trees() {
        let readme = snapshot
            .blobs_under(&project.path)
            .find(|n| n.path.to_lowercase().ends_with("readme.md"));
        if let Some(readme) = readme {
            let body = format!("# {}\n\nAbout {}.\n", project.path, project.path);
            transport = transport.with_file(config, snapshot, &readme.path, &body);
        }
    }

    transport
}

/// Shared handles for a catalog under test
pub fn shared(
    config: RepositoryConfig,
    transport: MockTransport,
) -> (Arc<RepositoryConfig>, Arc<MockTransport>) {
    (Arc::new(config), Arc::new(transport))
}
