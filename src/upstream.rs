//! Upstream Fetch
//!
//! Concrete fetch for route data served as JSON by an upstream HTTP API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::resolver::Fetch;

// == Http Fetch ==
/// Fetches a JSON document with a single GET request.
///
/// Transport errors, non-success statuses and bodies that are not JSON all
/// fail the fetch. The client timeout bounds how long a cycle can stay in flight.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
    url: String,
}

impl HttpFetch {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Fetch<Value> for HttpFetch {
    async fn fetch(&self) -> anyhow::Result<Value> {
        debug!("GET {}", self.url());

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {}", self.url))?;

        response
            .json::<Value>()
            .await
            .with_context(|| format!("GET {} returned invalid JSON", self.url))
    }
}

/// Builds the shared upstream client with the given request timeout.
pub fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build upstream HTTP client")
}
