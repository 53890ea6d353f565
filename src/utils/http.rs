// src/utils/http.rs

//! HTTP transport for the schedule site.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, SiteConfig};

/// Network access needed by an update cycle.
///
/// Failures surface as `Err`, never as panics.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the schedule listing page as HTML text.
    async fn fetch_listing_page(&self) -> Result<String>;

    /// Download one schedule document.
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()?;
    Ok(client)
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    listing_url: String,
}

impl HttpTransport {
    /// Create a transport from site and client settings.
    pub fn new(site: &SiteConfig, crawler: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(crawler)?, &site.base_url))
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: Client, listing_url: impl Into<String>) -> Self {
        Self {
            client,
            listing_url: listing_url.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_listing_page(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.listing_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::download(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::download(url, status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::download(url, e))?;
        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
