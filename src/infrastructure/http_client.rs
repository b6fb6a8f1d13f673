//! HTTP client for marketplace page fetching
//!
//! Thin reqwest wrapper with rate limiting, a browser-like identity, and
//! cancellation support. Timeout policy lives here and is externally
//! configurable; the extraction pipeline has no timeouts of its own.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::config::defaults;

/// HTTP client configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HttpClientConfig {
    /// Browser-like user agent; the marketplace serves degraded markup to
    /// obvious bots.
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

/// Rate-limited HTTP client for respectful marketplace access.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            config,
        })
    }

    /// Fetch a URL and return the body as text. Non-success statuses are
    /// errors.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("Fetching URL: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP request failed with status {}: {}", response.status(), url);
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))?;

        tracing::debug!("Fetched {} ({} chars)", url, text.len());
        Ok(text)
    }

    /// Like [`get_text`], but resolves early with an error when the token is
    /// cancelled. Cancellation mid-request leaves no partial result behind.
    ///
    /// [`get_text`]: Self::get_text
    pub async fn get_text_with_cancellation(
        &self,
        url: &str,
        cancellation_token: CancellationToken,
    ) -> Result<String> {
        if cancellation_token.is_cancelled() {
            anyhow::bail!("Request cancelled before starting");
        }

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {},
            _ = cancellation_token.cancelled() => {
                anyhow::bail!("Request cancelled during rate limiting");
            }
        }

        let response = tokio::select! {
            result = self.client.get(url).send() => {
                result.with_context(|| format!("Failed to fetch URL: {url}"))?
            },
            _ = cancellation_token.cancelled() => {
                anyhow::bail!("Request cancelled in flight: {url}");
            }
        };

        if !response.status().is_success() {
            anyhow::bail!("HTTP request failed with status {}: {}", response.status(), url);
        }

        let text = tokio::select! {
            result = response.text() => {
                result.with_context(|| format!("Failed to read response body from: {url}"))?
            },
            _ = cancellation_token.cancelled() => {
                anyhow::bail!("Response reading cancelled: {url}");
            }
        };

        Ok(text)
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
