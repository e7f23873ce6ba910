//! Document summarization through a language model.
//!
//! # Architecture
//!
//! - [`Summarize`]: core trait, one text in, one summary out
//! - [`AwfulJadeSummarizer`]: backend over the `awful_aj` OpenAI-compatible client
//! - [`Retrying`]: decorator adding exponential backoff to any [`Summarize`]
//! - [`summarize_document`]: windowed summarization of a whole document
//!
//! # Windowing
//!
//! Models have an input-length limit, so a document is cut into fixed-size
//! character windows by [`chunk_text`] and each window is summarized on its
//! own, in order. The partial summaries are joined with blank lines. Windows
//! ignore sentence boundaries.

use crate::config::SummarySettings;
use crate::error::ScrapeError;
use crate::models::non_empty;
use crate::utils::{backoff_delay, truncate_for_log};
use awful_aj::api::ask;
use awful_aj::config::{self, AwfulJadeConfig};
use awful_aj::template::{self, ChatTemplate};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Something that can condense a piece of text.
pub trait Summarize {
    async fn summarize(&self, text: &str) -> Result<String, ScrapeError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`Summarize`] implementation.
///
/// Only transient errors are retried. The delay between retries is
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + jitter
/// ```
pub struct Retrying<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> Retrying<T>
where
    T: Summarize,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for Retrying<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Summarize for Retrying<T>
where
    T: Summarize,
{
    #[instrument(level = "debug", skip_all)]
    async fn summarize(&self, text: &str) -> Result<String, ScrapeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.summarize(text).await {
                Ok(summary) => return Ok(summary),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "summarize() gave up"
                        );
                        return Err(e);
                    }

                    let delay = backoff_delay(self.base_delay, self.max_delay, attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Summarizer backed by `awful_aj`: an OpenAI-compatible endpoint plus a chat
/// template that tells the model how to summarize a press release.
#[derive(Debug)]
pub struct AwfulJadeSummarizer {
    config: AwfulJadeConfig,
    template: ChatTemplate,
}

impl AwfulJadeSummarizer {
    /// Load the awful_aj configuration and chat template.
    ///
    /// Without `config_path`, `config.yaml` in awful_aj's config directory is used.
    #[instrument(level = "info")]
    pub async fn load(config_path: Option<&Path>, template_name: &str) -> Result<Self, ScrapeError> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => awful_aj::config_dir()
                .map_err(|e| ScrapeError::Config(format!("no awful_aj config directory: {e}")))?
                .join("config.yaml"),
        };
        let config_str = config_path.to_str().ok_or_else(|| {
            ScrapeError::Config(format!("not a valid config filename: {}", config_path.display()))
        })?;

        let config = config::load_config(config_str)
            .map_err(|e| ScrapeError::Config(format!("cannot load {config_str}: {e:?}")))?;
        let template = template::load_template(template_name)
            .await
            .map_err(|e| ScrapeError::Config(format!("cannot load template `{template_name}`: {e}")))?;

        info!(config_path = config_str, template = template_name, "Loaded summarizer");
        Ok(Self { config, template })
    }
}

impl Summarize for AwfulJadeSummarizer {
    #[instrument(level = "info", skip_all, fields(chars = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String, ScrapeError> {
        let t0 = Instant::now();
        let res = ask(&self.config, text.to_string(), &self.template, None, None).await;
        let dt = t0.elapsed();

        match res {
            Ok(answer) => {
                debug!(
                    elapsed_ms = dt.as_millis(),
                    answer = %truncate_for_log(&answer, 200),
                    "Model answered"
                );
                Ok(answer.trim().to_string())
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis(), error = %e, "API call failed");
                Err(ScrapeError::Summarizer(e.to_string()))
            }
        }
    }
}

/// Split `text` into consecutive windows of `window` characters.
///
/// The last window may be shorter. Windows never split a UTF-8 code point and
/// their concatenation is exactly `text`. A `window` of 0 is treated as 1.
pub fn chunk_text(text: &str, window: usize) -> Vec<&str> {
    let window = window.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == window {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Summarize a whole document window by window.
///
/// The text is cut with [`chunk_text`], blank windows are dropped and at most
/// `max_chunks` windows are sent, one at a time. The partial summaries are
/// joined in window order.
///
/// # Arguments
///
/// * `summarizer` - Model backend
/// * `text` - Full document text (PDF text or page body)
/// * `settings` - Window size, window cap and minimum length
///
/// # Returns
///
/// `Ok(None)` when the text is shorter than `min_chars` or the model produced
/// nothing, otherwise the joined summary.
///
/// # Errors
///
/// The first window failure fails the whole document.
///
/// # Examples
///
/// ```ignore
/// let summary = summarize_document(&backend, &pdf_text, &profile.summary).await?;
/// ```
#[instrument(level = "info", skip_all, fields(chars = text.len()))]
pub async fn summarize_document<S: Summarize>(
    summarizer: &S,
    text: &str,
    settings: &SummarySettings,
) -> Result<Option<String>, ScrapeError> {
    let chars = text.chars().count();
    if chars < settings.min_chars {
        debug!(chars, min = settings.min_chars, "Text too short to summarize");
        return Ok(None);
    }

    let windows: Vec<&str> = chunk_text(text, settings.chunk_chars)
        .into_iter()
        .filter(|window| !window.trim().is_empty())
        .take(settings.max_chunks.unwrap_or(usize::MAX))
        .collect();
    let window_count = windows.len();

    let parts: Vec<String> = stream::iter(windows)
        .then(|window| summarizer.summarize(window))
        .try_collect()
        .await?;

    let summary = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    info!(windows = window_count, summary_chars = summary.len(), "Summarized document");
    Ok(non_empty(summary))
}
