//! Repository configuration
//!
//! Identifies the one repository a catalog discovers projects in, and the
//! hosts used to reach it. Loaded from `config.yaml` in the platform config
//! directory, falling back to built-in defaults when the file is absent.
//!
//! ```yaml
//! repository: fivethirtyeight/data
//! api_url: https://api.github.com
//! raw_url: https://raw.githubusercontent.com
//! web_url: https://www.github.com
//! timeout_seconds: 30
//! ttl_seconds: 60
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default repository identifier
pub const DEFAULT_REPOSITORY: &str = "fivethirtyeight/data";

/// Default REST API host
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default raw-content host
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";

/// Default human-facing web host
pub const DEFAULT_WEB_URL: &str = "https://www.github.com";

/// Where the repository lives and how long loaded catalogs stay fresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository identifier in `owner/name` form
    #[serde(default = "default_repository")]
    pub repository: String,

    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Raw file content base URL
    #[serde(default = "default_raw_url")]
    pub raw_url: String,

    /// Browsable web base URL
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// How long a root catalog serves its cached project list
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            api_url: default_api_url(),
            raw_url: default_raw_url(),
            web_url: default_web_url(),
            timeout_seconds: default_timeout(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_repository() -> String {
    DEFAULT_REPOSITORY.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_raw_url() -> String {
    DEFAULT_RAW_URL.to_string()
}

fn default_web_url() -> String {
    DEFAULT_WEB_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_ttl() -> u64 {
    60
}

impl RepositoryConfig {
    /// Configuration for another repository on the default hosts
    pub fn for_repository(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path, using defaults if it does not exist
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path).with_context(|| {
                format!("Failed to read config: {}", config_path.display())
            })?;
            serde_yaml_ng::from_str(&content).with_context(|| {
                format!("Failed to parse config: {}", config_path.display())
            })?
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Write the configuration as YAML
    pub fn save(&self, config_path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self).context("Failed to serialize config")?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = directories::ProjectDirs::from("com", "five38", "five38")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("five38")))
            .context("Could not determine config directory")?;

        Ok(config_dir.join("config.yaml"))
    }

    /// Reject hosts that are not http(s) and repositories that are not `owner/name`
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [
            ("api_url", &self.api_url),
            ("raw_url", &self.raw_url),
            ("web_url", &self.web_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{field} must start with http:// or https:// (got '{url}')");
            }
        }

        let mut parts = self.repository.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(()),
            _ => anyhow::bail!(
                "repository must be in owner/name form (got '{}')",
                self.repository
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Repository metadata endpoint
    pub fn repo_api_url(&self) -> String {
        format!("{}/repos/{}", trim(&self.api_url), self.repository)
    }

    /// Branch metadata endpoint
    pub fn branch_api_url(&self, branch: &str) -> String {
        format!("{}/branches/{}", self.repo_api_url(), branch)
    }

    /// Recursive tree endpoint for a commit
    pub fn tree_api_url(&self, sha: &str) -> String {
        format!("{}/git/trees/{}?recursive=1", self.repo_api_url(), sha)
    }

    /// Raw content URL of a file pinned to a commit
    pub fn raw_file_url(&self, sha: &str, path: &str) -> String {
        format!("{}/{}/{}/{}", trim(&self.raw_url), self.repository, sha, path)
    }

    /// Browsable URL of a directory pinned to a commit
    pub fn browse_url(&self, sha: &str, path: &str) -> String {
        format!(
            "{}/{}/tree/{}/{}",
            trim(&self.web_url),
            self.repository,
            sha,
            path
        )
    }
}

fn trim(url: &str) -> &str {
    url.trim_end_matches('/')
}
