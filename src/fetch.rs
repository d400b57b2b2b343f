// src/fetch.rs
use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::{MAX_RETRIES, REQUEST_TIMEOUT, RETRY_DELAY, USER_AGENT as BROWSER_UA};
use crate::error::{Result, ScraperError};

/// Blocking-style HTTP access: one request at a time, a fixed number of
/// attempts with a fixed pause between them.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
        })
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Fetches a URL with a retry mechanism.
    async fn fetch_with_retries(&self, url: &str) -> Result<Response> {
        for attempt in 1..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }
                    warn!(
                        "Request to {} failed with status: {} (attempt {}/{})",
                        url,
                        response.status(),
                        attempt,
                        self.max_retries
                    );
                }
                Err(e) => {
                    warn!(
                        "Request to {} failed with error: {} (attempt {}/{})",
                        url, e, attempt, self.max_retries
                    );
                }
            }

            if attempt < self.max_retries {
                sleep(self.retry_delay).await;
            }
        }

        error!("Giving up on {}", url);
        Err(ScraperError::MaxRetriesExceeded(url.to_string()))
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.fetch_with_retries(url).await?;
        Ok(response.text().await?)
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.fetch_with_retries(url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Downloads `url` into `dest`, creating parent directories.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let bytes = self.fetch_bytes(url).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }
}
