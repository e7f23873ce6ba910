//! HTTP fetching with session memoization, politeness delay and retries.
//!
//! Pages are fetched one at a time. Every request that reaches the network is
//! followed by `request_delay` so a listing crawl does not hammer the site.
//! Transient failures (connection errors, timeouts, HTTP 429 and 5xx) are
//! retried with exponential backoff and jitter; anything else fails at once.

use crate::cache::SessionCache;
use crate::config::HttpSettings;
use crate::error::ScrapeError;
use crate::utils::backoff_delay;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    pages: SessionCache<String>,
    hits: AtomicUsize,
    retries: usize,
    base_delay: Duration,
    request_delay: Duration,
}

impl Fetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ScrapeError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            pages: SessionCache::new(),
            hits: AtomicUsize::new(0),
            retries: settings.retries,
            base_delay: settings.backoff(),
            request_delay: settings.request_delay(),
        })
    }

    /// Fetch a page as text, memoized by URL for the life of this fetcher.
    ///
    /// Transient failures (timeouts, connection errors, 5xx and 429) are
    /// retried with exponential backoff. Failures are never cached, so a later
    /// call tries the network again.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    ///
    /// # Returns
    ///
    /// The response body, either fresh or from the session cache.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Status`] for a non-success status and
    /// [`ScrapeError::Http`] when the request itself fails, after retries run out.
    #[instrument(level = "info", skip(self), fields(%url))]
    pub async fn get_text(&self, url: &Url) -> Result<String, ScrapeError> {
        if let Some(body) = self.pages.get(url.as_str()) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(bytes = body.len(), "Served page from session cache");
            return Ok(body);
        }

        let body = self
            .with_retries(url, || async move {
                let response = self.send(url).await?;
                response.text().await.map_err(|source| ScrapeError::Http {
                    url: url.to_string(),
                    source,
                })
            })
            .await?;

        info!(bytes = body.len(), "Fetched page");
        self.pages.insert(url.as_str(), body.clone());
        Ok(body)
    }

    /// Fetch a binary document. Not memoized; callers cache what they derive from it.
    #[instrument(level = "info", skip(self), fields(%url))]
    pub async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, ScrapeError> {
        let bytes = self
            .with_retries(url, || async move {
                let response = self.send(url).await?;
                response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|source| ScrapeError::Http {
                        url: url.to_string(),
                        source,
                    })
            })
            .await?;
        info!(bytes = bytes.len(), "Fetched document");
        Ok(bytes)
    }

    /// Number of requests answered from the session cache so far.
    pub fn cache_hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, ScrapeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn with_retries<T, F, Fut>(&self, url: &Url, op: F) -> Result<T, ScrapeError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let result = op().await;
            if !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.base_delay, MAX_BACKOFF, attempt);
                    warn!(
                        %url,
                        attempt,
                        max = self.retries,
                        ?delay,
                        error = %e,
                        "Request failed; backing off"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        %url,
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "Request failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}
