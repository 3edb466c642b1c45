//! congress.gov API client
//!
//! Paginated member retrieval with client-side rate limiting and
//! bounded retries. congress.gov caps API keys at a few thousand
//! requests per hour, so every attempt waits on the rate limiter
//! before hitting the network.

use crate::config::{Config, JitterMode, RetryPolicy};
use crate::error::{Error, Result};
use crate::models::{MemberPage, RawMember};
use std::time::{Duration, Instant};

const USER_AGENT: &str = "capitol-sync/0.1.0 (https://github.com/capitol-sync/capitol-sync)";

/// congress.gov API client
pub struct CongressClient {
    http_client: reqwest::Client,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
    page_limit: u32,
}

impl CongressClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.retry.request_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        // Safe: requests_per_second is clamped to at least 1
        let quota = governor::Quota::per_second(
            std::num::NonZeroU32::new(config.requests_per_second.max(1)).unwrap(),
        );

        Ok(Self {
            http_client,
            rate_limiter: governor::RateLimiter::direct(quota),
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            page_limit: config.page_limit,
        })
    }

    /// Retrieve the full member list for one Congress.
    ///
    /// Pages of `page_limit` are requested in offset order; the first
    /// page shorter than the limit (an empty page included) is the
    /// last. The upstream total-count field is not consulted.
    pub async fn list_members(&self, congress: u16) -> Result<Vec<RawMember>> {
        let mut members = Vec::new();
        let mut offset = 0u32;

        loop {
            let url = format!(
                "{}/member?congress={}&limit={}&offset={}",
                self.base_url, congress, self.page_limit, offset
            );

            let page = self.fetch_page(&url).await?;
            let page_len = page.members.len();
            members.extend(page.members);

            tracing::debug!(congress, offset, page_len, "Retrieved member page");

            if (page_len as u32) < self.page_limit {
                break;
            }
            offset += self.page_limit;
        }

        tracing::info!(congress, members = members.len(), "Member list retrieved");

        Ok(members)
    }

    /// One logical fetch: up to `max_attempts` attempts with
    /// exponentially backed-off, jittered delays in between.
    async fn fetch_page(&self, url: &str) -> Result<MemberPage> {
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                let delay = backoff_delay(&self.retry, attempt);
                tracing::debug!(url, attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            self.rate_limiter.until_ready().await;

            let started = Instant::now();
            match self.attempt(url).await {
                Ok(page) => {
                    tracing::debug!(
                        url,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Fetch succeeded"
                    );
                    return Ok(page);
                }
                Err(cause) => {
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %cause,
                        "Fetch attempt failed"
                    );
                    last_error = cause;
                }
            }
        }

        Err(Error::Fetch {
            url: url.to_string(),
            attempts: self.retry.max_attempts,
            last_error,
        })
    }

    /// Single attempt. A non-2xx status is a retryable failure with the
    /// response body captured for diagnostics. The API key travels as a
    /// query parameter but is kept out of the URL used in errors.
    async fn attempt(&self, url: &str) -> std::result::Result<MemberPage, String> {
        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| format!("network error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("status {}: {}", status.as_u16(), truncate(&body, 256)));
        }

        response
            .json::<MemberPage>()
            .await
            .map_err(|e| format!("parse error: {}", e))
    }
}

/// Delay before the given attempt (attempt >= 2): the exponential
/// window `base * multiplier^(n-1)`, randomized per the policy's
/// jitter mode so concurrent callers don't retry in lockstep.
fn backoff_delay(retry: &RetryPolicy, attempt: u32) -> Duration {
    let window = retry
        .base_delay
        .mul_f64(retry.backoff_multiplier.powi(attempt as i32 - 2));
    match retry.jitter {
        JitterMode::Full => window.mul_f64(rand::random::<f64>()),
        JitterMode::None => window,
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
