//! Transport trait - Abstraction over the upstream HTTP host
//!
//! Catalogs only ever issue unauthenticated GETs and read the body as text.
//! This trait allows swapping between:
//! - `HttpTransport` (blocking reqwest client)
//! - in-memory fakes (testing)

use crate::config::RepositoryConfig;
use crate::error::{Result, UpstreamError};

/// Blocking GET-as-text against the upstream host
pub trait Transport: Send + Sync {
    /// Fetch `url` and return its body.
    ///
    /// Any non-success status must surface as `UpstreamError::Status`.
    fn get_text(&self, url: &str) -> Result<String>;

    /// Transport identifier for logging/debugging
    fn name(&self) -> &'static str;
}

/// Fetch `url` and deserialize the body as JSON
pub fn get_json<T: serde::de::DeserializeOwned>(
    transport: &dyn Transport,
    url: &str,
) -> Result<T> {
    let body = transport.get_text(url)?;
    serde_json::from_str(&body).map_err(|source| {
        UpstreamError::Malformed {
            url: url.to_string(),
            source,
        }
        .into()
    })
}

/// HTTP transport backed by `reqwest::blocking`
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &RepositoryConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("five38/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| UpstreamError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        response.text().map_err(|e| {
            UpstreamError::Request {
                url: url.to_string(),
                message: format!("failed to read response body: {e}"),
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
