//! HTTP fetching of the status page and the forecast feed

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::{config::ForecastConfig, errors::SyncError};

const USER_AGENT: &str = concat!("pass-sync/", env!("CARGO_PKG_VERSION"));

/// Source of raw response bodies.
///
/// One attempt per call; retrying is left to the next scheduled run.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, SyncError>;
}

/// Fetcher backed by a shared `reqwest` client with a bounded timeout
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SyncError> {
        debug!(url = %redact_query(url), "Fetching");
        // Errors carry no URL, the query holds the API key
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: redact_query(url),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await.map_err(reqwest::Error::without_url)?)
    }
}

/// URL without its query string, safe to log
pub fn redact_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.into()
        }
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}

impl ForecastConfig {
    /// Feed URL for the configured coordinates
    pub fn feed_url(&self) -> Result<String, SyncError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("lat", self.lat.to_string()),
                ("lon", self.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
                ("lang", self.lang.clone()),
            ],
        )
        .map_err(|e| SyncError::ConfigurationError {
            message: format!("Invalid forecast base URL: {}", e),
        })?;

        Ok(url.into())
    }
}
