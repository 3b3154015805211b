// Node exporter scraping over HTTP (reqwest)

use crate::error::PollError;
use crate::version;
use std::time::Duration;
use tracing::instrument;

pub fn metrics_url(node: &str, port: u16) -> String {
    format!("http://{}:{}/metrics", node, port)
}

/// Shared client for every node; per-request timeout bounds one poll cycle.
pub fn http_client(request_timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(version::user_agent())
        .build()?;
    Ok(client)
}

#[derive(Debug, Clone)]
pub struct NodeExporterRepo {
    client: reqwest::Client,
    url: String,
}

impl NodeExporterRepo {
    pub fn new(client: reqwest::Client, node: &str, port: u16) -> Self {
        Self::with_url(client, metrics_url(node, port))
    }

    pub fn with_url(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the exposition body. Non-success statuses are transport errors.
    #[instrument(skip(self), fields(repo = "node_exporter", operation = "fetch_text", url = %self.url))]
    pub async fn fetch_text(&self) -> Result<String, PollError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        tracing::debug!(bytes = body.len(), "scrape complete");
        Ok(body)
    }
}
