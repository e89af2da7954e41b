//! HTTP fetch layer: client construction, retrying GET, and rate limiting.
//!
//! Every outbound request in the pipeline goes through [`RetryingClient`],
//! which wraps a `reqwest::Client` with bounded retries and exponential
//! backoff, and is paced by a shared [`RateLimiter`] that caps the aggregate
//! request rate across all concurrent workers.
//!
//! # Retry strategy
//!
//! - Up to [`MAX_RETRIES`] retry attempts
//! - Retry only on transport errors and 503 Service Unavailable; any other
//!   non-200 status is terminal
//! - Exponential backoff starting at [`INITIAL_BACKOFF`], multiplied by
//!   [`BACKOFF_FACTOR`] per failed attempt
//! - Random jitter (0-500ms) added to each delay to prevent thundering herd
//!
//! A fetch never fails the pipeline: exhausted retries and terminal statuses
//! are logged and surface as `None`.

use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, warn};

/// Root of all live discussion and exam URLs.
pub const BASE_URL: &str = "https://www.examtopics.com";
/// GitHub contents API root for the pre-scraped question mirror.
pub const CACHE_REPO_URL: &str =
    "https://api.github.com/repos/thatonecodes/examtopics-data/contents";

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
pub const MAX_CONCURRENT_REQUESTS: usize = 15;
pub const REQUESTS_PER_SECOND: f64 = 2.0;
pub const MAX_RETRIES: usize = 3;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const BACKOFF_FACTOR: f64 = 2.0;

/// Build the HTTP client for a run.
///
/// When `token` is supplied the client authenticates every request with a
/// bearer header; the pipeline builds such a client for the cache path only,
/// so the credential never leaks to the live site.
pub fn build_client(token: Option<&str>) -> Result<Client, Box<dyn Error>> {
    let mut builder = Client::builder().timeout(HTTP_TIMEOUT).user_agent(concat!(
        "examtopics-downloader/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(token) = token {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        builder = builder.default_headers(headers);
    }

    Ok(builder.build()?)
}

/// A `reqwest::Client` wrapped with bounded retries and exponential backoff.
///
/// The retry policy lives in the constructor so tests can shrink the delays.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    client: Client,
    max_retries: usize,
    initial_backoff: Duration,
    backoff_factor: f64,
}

impl RetryingClient {
    /// Wrap `client` with the default retry policy.
    pub fn new(client: Client) -> Self {
        Self::with_policy(client, MAX_RETRIES, INITIAL_BACKOFF, BACKOFF_FACTOR)
    }

    /// Wrap `client` with an explicit retry policy.
    pub fn with_policy(
        client: Client,
        max_retries: usize,
        initial_backoff: Duration,
        backoff_factor: f64,
    ) -> Self {
        Self {
            client,
            max_retries,
            initial_backoff,
            backoff_factor,
        }
    }

    /// GET `url` and return the complete response body, or `None`.
    ///
    /// All-or-nothing: a `Some` result is always a full, non-truncated body.
    /// Transport errors and 503 responses are retried with backoff; any
    /// other non-200 status is terminal.
    pub async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let jitter = Duration::from_millis(rng().random_range(0..500));
                let delay = backoff + jitter;
                warn!(attempt, %url, ?delay, "retrying after backoff");
                sleep(delay).await;
                backoff = backoff.mul_f64(self.backoff_factor);
            }

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, %url, error = %e, "request failed");
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::OK {
                match response.bytes().await {
                    Ok(body) => return Some(body.to_vec()),
                    Err(e) => {
                        warn!(%url, error = %e, "failed to read response body");
                        return None;
                    }
                }
            }

            if status != StatusCode::SERVICE_UNAVAILABLE {
                warn!(%url, status = %status, "request failed with terminal status");
                return None;
            }
            debug!(attempt, %url, "service unavailable");
        }

        warn!(%url, "exhausted retries");
        None
    }
}

/// Global outbound-request throttle shared by every worker in a run.
///
/// A token bucket: a background task refills one permit per `1/rps` tick,
/// capped at one second's worth of tokens, and [`acquire`](Self::acquire)
/// consumes one permit per request. Must be [`stop`](Self::stop)ped (or
/// dropped) at the end of a run to release the refill task.
#[derive(Debug)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    refill: JoinHandle<()>,
}

impl RateLimiter {
    /// Create a limiter emitting `rps` permits per second.
    pub fn new(rps: f64) -> Self {
        let permits = Arc::new(Semaphore::new(0));
        let capacity = (rps.ceil() as usize).max(1);
        let tick = Duration::from_secs_f64((1.0 / rps.max(0.001)).min(3600.0));

        let bucket = Arc::clone(&permits);
        let refill = tokio::spawn(async move {
            let mut ticker = interval(tick);
            loop {
                ticker.tick().await;
                // Cap the bucket so idle time cannot bank an unbounded burst.
                if bucket.available_permits() < capacity {
                    bucket.add_permits(1);
                }
            }
        });

        Self { permits, refill }
    }

    /// Wait for and consume one permit.
    pub async fn acquire(&self) {
        match self.permits.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => warn!("rate limiter stopped; proceeding without permit"),
        }
    }

    /// Stop the refill task. Permits already granted remain usable.
    pub fn stop(&self) {
        self.refill.abort();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.refill.abort();
    }
}
