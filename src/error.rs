//! Typed errors for the scraping pipeline.
//!
//! Per-record problems (a detail page that fails to load, a PDF with no text,
//! a summary that could not be produced) are not errors: the pipeline logs them,
//! counts them in the [`RunReport`](crate::models::RunReport) and moves on.
//! `ScrapeError` is reserved for failures that end a run or an operation.

use thiserror::Error;

/// Errors that can end a scrape run or one of its operations.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The HTTP request could not be completed.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// A URL could not be parsed or resolved.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request submitted by the user is inconsistent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A configured CSS selector or pattern does not compile.
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// An RSS listing could not be parsed.
    #[error("feed parse error: {0}")]
    Feed(#[from] quick_xml::DeError),

    /// The downloaded document is not a PDF or could not be read.
    #[error("PDF extraction failed for {url}: {reason}")]
    Pdf { url: String, reason: String },

    /// The summarization backend failed.
    #[error("summarizer error: {0}")]
    Summarizer(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ScrapeError {
    /// Whether retrying the same operation might succeed.
    ///
    /// Connection problems, timeouts, throttling and server-side errors are
    /// transient. Everything else (4xx, malformed content, bad input) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            ScrapeError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            ScrapeError::Summarizer(_) => true,
            _ => false,
        }
    }
}
