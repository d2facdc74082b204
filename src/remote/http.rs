//! HTTP client for the culture service

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{RemoteError, RemoteSource, Result};
use crate::config::RemoteConfig;
use crate::culture::{Catalogue, Culture};
use crate::deadline::Deadline;

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    cultures: Vec<CatalogueEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogueEntry {
    name: String,
    modified: i64,
}

/// Culture service client
///
/// - `GET {base_url}/cultures` lists names and modified times
/// - `GET {base_url}/cultures/{name}` fetches one culture
///
/// Transient failures (connection errors, 5xx) are retried with exponential
/// backoff, never past the caller's deadline.
pub struct HttpRemote {
    client: Client,
    base_url: Url,
    config: RemoteConfig,
}

impl HttpRemote {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::Network(format!("invalid base url: {}", e)))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Build `{base_url}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Network(format!("base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode the JSON body, retrying transient failures
    async fn get_json<T>(&self, url: Url, name: Option<&str>, deadline: &Deadline) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let error = match self.get_once(&url, name, deadline).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(%url, attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !error.is_transient() || attempt > self.config.max_retries {
                warn!(%url, attempt, error = %error, "Request failed");
                return Err(error);
            }

            let backoff = self.backoff(attempt);
            if matches!(deadline.remaining(), Some(left) if left <= backoff) {
                warn!(%url, attempt, error = %error, "No time left to retry");
                return Err(error);
            }

            warn!(%url, attempt, error = %error, ?backoff, "Request failed, retrying");
            tokio::time::sleep(backoff).await;
        }
    }

    async fn get_once<T>(&self, url: &Url, name: Option<&str>, deadline: &Deadline) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        if deadline.is_expired() {
            return Err(RemoteError::DeadlineExceeded);
        }

        debug!(%url, "Sending request");

        let response = self
            .client
            .get(url.clone())
            .timeout(deadline.clamp(self.config.request_timeout))
            .send()
            .await
            .map_err(|e| classify(e, deadline))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(name) = name {
                return Err(RemoteError::NotFound(name.to_string()));
            }
        }
        if !status.is_success() {
            return Err(RemoteError::Server {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response.json::<T>().await.map_err(|e| classify(e, deadline))
    }

    /// 1x, 2x, 4x ... the configured base backoff
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config.retry_backoff.saturating_mul(factor)
    }
}

fn classify(error: reqwest::Error, deadline: &Deadline) -> RemoteError {
    if error.is_timeout() && deadline.is_expired() {
        RemoteError::DeadlineExceeded
    } else if error.is_decode() {
        RemoteError::Malformed(error.to_string())
    } else if error.is_timeout() {
        RemoteError::Network("request timed out".to_string())
    } else {
        RemoteError::Network(error.to_string())
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn get_record(&self, name: &str, deadline: &Deadline) -> Result<Culture> {
        let url = self.endpoint(&["cultures", name])?;
        let culture: Culture = self.get_json(url, Some(name), deadline).await?;
        debug!(name, modified = culture.modified, "Fetched culture");
        Ok(culture)
    }

    async fn list_records(&self, deadline: &Deadline) -> Result<Catalogue> {
        let url = self.endpoint(&["cultures"])?;
        let response: CatalogueResponse = self.get_json(url, None, deadline).await?;
        debug!(count = response.cultures.len(), "Fetched catalogue");
        Ok(response
            .cultures
            .into_iter()
            .map(|entry| (entry.name, entry.modified))
            .collect())
    }
}
