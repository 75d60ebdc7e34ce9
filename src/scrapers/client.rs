// src/scrapers/client.rs

//! HTTP fetch client with retry and exponential backoff.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

/// Ceiling for retry backoff sleeps.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// HTTP client for one scrape task.
///
/// Carries the fixed identity header profile and the total request timeout.
/// Transient failures (network fault, timeout, non-2xx) are retried up to
/// the configured attempt cap with exponential backoff; anything else
/// surfaces immediately. Each scrape task builds its own client so tasks
/// never contend on a shared session.
pub struct FetchClient {
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl FetchClient {
    /// Create a configured client.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7"),
        );

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            base_delay: Duration::from_secs(config.retry_base_delay_secs),
        })
    }

    /// GET a page as text, retrying transient failures.
    pub async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_fetch(url, params).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    log::warn!(
                        "Fetch attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt,
                        self.max_retries,
                        url,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Exponential backoff for the given attempt number, capped at 60s.
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(MAX_BACKOFF)
    }
}
