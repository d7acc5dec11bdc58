//! Catalog error types

use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failure talking to the upstream repository host
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The host answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The response body was not the JSON we expected
    #[error("malformed payload from {url}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// URL of the request that failed
    pub fn url(&self) -> &str {
        match self {
            UpstreamError::Status { url, .. }
            | UpstreamError::Request { url, .. }
            | UpstreamError::Malformed { url, .. } => url,
        }
    }
}

/// Errors raised while building or traversing a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// A project directory has no README to describe it
    #[error("no README found for project '{project}'")]
    DocumentationMissing { project: String },

    /// Opening or loading a nested catalog failed during a walk.
    /// The walker logs these and drops the branch.
    #[error("failed to descend into '{path}': {source}")]
    DescentFailure {
        path: String,
        #[source]
        source: Box<CatalogError>,
    },

    /// Lookup of an entry name the catalog does not contain
    #[error("no entry named '{name}'")]
    UnknownEntry { name: String },
}

impl CatalogError {
    /// True for failures that came from the upstream host
    pub fn is_upstream(&self) -> bool {
        matches!(self, CatalogError::Upstream(_))
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_upstream_status_message() {
        let err: CatalogError = UpstreamError::Status {
            url: "https://api.example.com/repos/a/b".to_string(),
            status: 404,
        }
        .into();

        assert!(err.is_upstream());
        assert_eq!(
            err.to_string(),
            "upstream error: HTTP 404 from https://api.example.com/repos/a/b"
        );
    }

    #[test]
    fn test_descent_failure_wraps_source() {
        let err = CatalogError::DescentFailure {
            path: "elections".to_string(),
            source: Box::new(CatalogError::DocumentationMissing {
                project: "elections".to_string(),
            }),
        };

        assert!(!err.is_upstream());
        assert!(err.to_string().contains("no README found for project 'elections'"));
    }
}
