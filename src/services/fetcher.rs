// src/services/fetcher.rs

//! Standings page fetcher.
//!
//! One logical GET per call. Timeouts are retried with exponential backoff
//! (`backoff_base ^ attempt` seconds) until the retry budget is spent; any
//! other failure, including a non-success status, is returned at once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Anything that can produce the raw standings document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the raw document.
    async fn fetch(&self) -> Result<String>;

    /// Where the document comes from, for log lines.
    fn endpoint(&self) -> &str;
}

/// Delay before retry number `attempt` (1-based).
pub fn backoff_delay(base: f64, attempt: u32) -> Duration {
    let secs = base.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
    if !secs.is_finite() || secs >= MAX_BACKOFF.as_secs_f64() {
        return MAX_BACKOFF;
    }
    Duration::from_secs_f64(secs.max(0.0))
}

/// HTTP fetcher with bounded retry.
pub struct Fetcher {
    client: Client,
    endpoint: String,
    max_retries: u32,
    backoff_base: f64,
}

impl Fetcher {
    /// Create a fetcher from the source configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = http::create_client(config)?;
        Ok(Self::with_client(
            client,
            &config.endpoint,
            config.max_retries,
            config.backoff_base,
        ))
    }

    /// Create a fetcher around an already configured client.
    pub fn with_client(
        client: Client,
        endpoint: impl Into<String>,
        max_retries: u32,
        backoff_base: f64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            max_retries,
            backoff_base,
        }
    }

    async fn fetch_once(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::network(
                Some(status.as_u16()),
                format!(
                    "{} from {}",
                    status.canonical_reason().unwrap_or("unexpected status"),
                    self.endpoint
                ),
            ));
        }

        response.text().await.map_err(classify)
    }
}

#[async_trait]
impl DocumentSource for Fetcher {
    async fn fetch(&self) -> Result<String> {
        let mut attempt = 0;

        loop {
            match self.fetch_once().await {
                Ok(body) => {
                    log::debug!("Fetched {} bytes from {}", body.len(), self.endpoint);
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.backoff_base, attempt);
                    log::warn!(
                        "{} (retry {}/{} in {:.2}s)",
                        e,
                        attempt,
                        self.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    return Err(AppError::network(
                        None,
                        format!(
                            "gave up on {} after {} attempts: {}",
                            self.endpoint,
                            attempt + 1,
                            e
                        ),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Split reqwest failures into retryable timeouts and final network errors.
fn classify(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(e.to_string())
    } else {
        AppError::network(e.status().map(|s| s.as_u16()), e)
    }
}
