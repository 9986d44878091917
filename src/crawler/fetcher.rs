//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - The politeness throttle shared by every request
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Why a URL could not be fetched
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeouts, connection failures, HTTP 5xx and 429, after all retries
    #[error("Transient failure for {url} after {attempts} attempts: {cause}")]
    Transient {
        url: String,
        cause: String,
        attempts: u32,
    },

    /// HTTP 4xx (other than 429) or another non-success status; never retried
    #[error("HTTP {status} for {url}")]
    NotFound { url: String, status: u16 },

    /// The request could not be issued at all (bad URL, redirect loop)
    #[error("Request for {url} rejected: {cause}")]
    Invalid { url: String, cause: String },

    /// The run was cancelled before the request went out
    #[error("Fetch of {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transient { url, .. }
            | FetchError::NotFound { url, .. }
            | FetchError::Invalid { url, .. }
            | FetchError::Cancelled { url } => url,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Page body
    pub body: String,

    /// Number of retries it took to get the page
    pub retries: u32,
}

/// Timing rules applied by [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Base delay between attempts; attempt `n` waits `n * retry_delay`
    pub retry_delay: Duration,

    /// Minimum spacing between any two requests
    pub politeness_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.crawler.max_retries,
            retry_delay: config.crawler.retry_delay(),
            politeness_delay: config.crawler.politeness_delay(),
        }
    }
}

/// Outcome of a single request attempt
enum Attempt {
    Done(FetchedPage),
    Retry(String),
    Fail(FetchError),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use archive_harvest::config::UserAgentConfig;
/// use archive_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests with throttling and bounded retries
///
/// One fetcher is shared by the listing crawl and every article worker, so
/// the politeness delay holds across all of them.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
    last_request: Mutex<Option<Instant>>,
    requests: AtomicU64,
    retries: AtomicU64,
    cancel: CancellationToken,
}

impl HttpFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            last_request: Mutex::new(None),
            requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Stops issuing requests once `cancel` fires
    ///
    /// Fetches waiting on the throttle or between retries give up with
    /// [`FetchError::Cancelled`]; a request already sent is allowed to finish.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builds the client and policy from a configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        Ok(Self::new(client, RetryPolicy::from_config(config)))
    }

    /// Total requests sent, retries included
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Total retries performed across all fetches
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Success |
    /// | HTTP 429 | Retry |
    /// | HTTP 5xx | Retry |
    /// | Other HTTP status | Immediate → NotFound |
    /// | Timeout / connect / body read error | Retry |
    /// | Invalid URL, redirect loop | Immediate → Invalid |
    ///
    /// Attempt `n` that fails transiently waits `n * retry_delay` before the
    /// next one. The politeness delay is applied before every attempt.
    /// Cancellation is honored during both waits.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let cancelled = || FetchError::Cancelled {
            url: url.to_string(),
        };
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                _ = self.throttle() => {}
            }

            let cause = match self.attempt(url).await {
                Attempt::Done(mut page) => {
                    page.retries = attempt - 1;
                    return Ok(page);
                }
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(cause) => cause,
            };

            if attempt > self.policy.max_retries {
                return Err(FetchError::Transient {
                    url: url.to_string(),
                    cause,
                    attempts: attempt,
                });
            }

            let delay = self.policy.retry_delay * attempt;
            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempt,
                url,
                cause,
                delay
            );
            self.retries.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                _ = sleep(delay) => {}
            }
        }
    }

    /// Waits until the politeness delay since the previous request has passed
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.policy.politeness_delay;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn attempt(&self, url: &str) -> Attempt {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(url, e),
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Attempt::Retry(format!("HTTP {}", status.as_u16()));
        }

        if !status.is_success() {
            return Attempt::Fail(FetchError::NotFound {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match response.text().await {
            Ok(body) => Attempt::Done(FetchedPage {
                final_url,
                status_code: status.as_u16(),
                body,
                retries: 0,
            }),
            Err(e) => Attempt::Retry(format!("Body read failed: {}", e)),
        }
    }
}

/// Sorts a transport error into retryable and permanent
fn classify_error(url: &str, e: reqwest::Error) -> Attempt {
    if e.is_timeout() {
        Attempt::Retry("Request timeout".to_string())
    } else if e.is_connect() {
        Attempt::Retry(format!("Connection failed: {}", e))
    } else if e.is_builder() || e.is_redirect() {
        Attempt::Fail(FetchError::Invalid {
            url: url.to_string(),
            cause: e.to_string(),
        })
    } else {
        // resets and other mid-request failures
        Attempt::Retry(e.to_string())
    }
}
