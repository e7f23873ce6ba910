//! Data models for press releases and scrape runs.
//!
//! This module defines the core data structures used throughout the application:
//! - [`PressRelease`]: one row of the result table and of every export
//! - [`ListingEntry`]: a release link discovered on a listing page or feed
//! - [`DetailPage`]: the fields parsed from one press-release page
//! - [`ScrapeRequest`]: what the form or command line asked for
//! - [`RunReport`] / [`RunOutcome`]: the records of a run plus what was dropped and why
//!
//! Records are ephemeral. Nothing is persisted between runs except the file the
//! user exports.

use crate::error::ScrapeError;
use crate::filters::{DateRange, MinistryFilter};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// One press release as shown in the result table and written to exports.
///
/// Optional text fields are never `Some("")`: constructors and the pipeline go
/// through [`non_empty`], so a CSV export reloads to an identical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressRelease {
    #[serde(rename = "Ministry")]
    pub ministry: Option<String>,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Source URL")]
    pub source_url: String,
    #[serde(rename = "PDF Link")]
    pub pdf_url: Option<String>,
    #[serde(rename = "PDF Text")]
    pub pdf_text: Option<String>,
    #[serde(rename = "Summary")]
    pub summary: Option<String>,
}

impl PressRelease {
    /// Start a record from a listing entry; detail, PDF and summary fields come later.
    pub fn from_entry(entry: &ListingEntry) -> Self {
        Self {
            ministry: entry.ministry.clone(),
            title: entry.title.clone(),
            date: entry.date,
            source_url: entry.url.to_string(),
            pdf_url: None,
            pdf_text: None,
            summary: None,
        }
    }

    /// Build a record straight from a detail page (single-page mode).
    pub fn from_detail(url: &Url, detail: &DetailPage) -> Self {
        Self {
            ministry: detail.ministry.clone(),
            title: detail.title.clone().unwrap_or_default(),
            date: detail.date,
            source_url: url.to_string(),
            pdf_url: detail.pdf_url.as_ref().map(Url::to_string),
            pdf_text: None,
            summary: None,
        }
    }

    /// Fill in what the detail page knows. Detail values win over listing values,
    /// except that a missing detail value never erases a listing value.
    pub fn merge_detail(&mut self, detail: &DetailPage) {
        if let Some(title) = &detail.title {
            self.title = title.clone();
        }
        if detail.ministry.is_some() {
            self.ministry = detail.ministry.clone();
        }
        if detail.date.is_some() {
            self.date = detail.date;
        }
        if let Some(pdf_url) = &detail.pdf_url {
            self.pdf_url = Some(pdf_url.to_string());
        }
    }
}

/// A press-release link found on a listing page or in a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub url: Url,
    pub ministry: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Fields parsed from a press-release detail page.
///
/// `body_text` is only used as summarization input when there is no PDF; it is
/// never exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    pub title: Option<String>,
    pub ministry: Option<String>,
    pub date_text: Option<String>,
    pub date: Option<NaiveDate>,
    pub pdf_url: Option<Url>,
    pub body_text: Option<String>,
}

/// How an input URL is scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A single press-release page.
    Detail,
    /// A paginated HTML listing of releases.
    Listing,
    /// An RSS feed of releases.
    Feed,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetKind::Detail => "detail",
            TargetKind::Listing => "listing",
            TargetKind::Feed => "feed",
        };
        f.write_str(name)
    }
}

/// Everything one run needs to know, from the form or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    /// `None` lets the pipeline classify the URL.
    pub kind: Option<TargetKind>,
    pub ministry: MinistryFilter,
    pub dates: DateRange,
    /// Maximum number of records to keep.
    pub limit: Option<usize>,
    /// Upper bound of the page-number loop for listings.
    pub max_pages: usize,
    pub follow_details: bool,
    pub extract_pdfs: bool,
    pub summarize: bool,
}

impl ScrapeRequest {
    /// A request with every optional stage switched off.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: None,
            ministry: MinistryFilter::Any,
            dates: DateRange::default(),
            limit: None,
            max_pages: 1,
            follow_details: false,
            extract_pdfs: false,
            summarize: false,
        }
    }

    /// Check the request and return the parsed URL.
    pub fn validate(&self) -> Result<Url, ScrapeError> {
        let url = Url::parse(self.url.trim())
            .map_err(|e| ScrapeError::InvalidRequest(format!("`{}` is not a URL: {e}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidRequest(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }
        if self.dates.is_inverted() {
            return Err(ScrapeError::InvalidRequest(
                "the start date is after the end date".to_string(),
            ));
        }
        if self.limit == Some(0) {
            return Err(ScrapeError::InvalidRequest(
                "the limit must be at least 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::InvalidRequest(
                "at least one listing page must be scanned".to_string(),
            ));
        }
        Ok(url)
    }
}

/// What happened to the candidates of a run.
///
/// Every candidate is either kept or counted under exactly one of the
/// `filtered_*`, `undated` or `over_limit` reasons. Failure counters describe
/// stages that degraded a record without dropping it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub kind: Option<TargetKind>,
    pub pages_scanned: usize,
    pub candidates: usize,
    pub kept: usize,
    pub filtered_by_ministry: usize,
    pub filtered_by_date: usize,
    pub undated: usize,
    pub over_limit: usize,
    pub detail_failures: usize,
    pub pdf_failures: usize,
    pub pdfs_without_text: usize,
    pub summary_failures: usize,
    pub cache_hits: usize,
}

impl RunReport {
    pub fn dropped(&self) -> usize {
        self.filtered_by_ministry + self.filtered_by_date + self.undated + self.over_limit
    }
}

/// The result of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub records: Vec<PressRelease>,
    pub report: RunReport,
}

/// `None` for blank strings, trimmed `Some` otherwise.
pub fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ListingEntry {
        ListingEntry {
            title: "Cabinet approves scheme".to_string(),
            url: Url::parse("https://pib.gov.in/PressReleasePage.aspx?PRID=1").unwrap(),
            ministry: Some("Cabinet".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 4, 17),
        }
    }

    #[test]
    fn test_record_from_entry() {
        let record = PressRelease::from_entry(&entry());
        assert_eq!(record.title, "Cabinet approves scheme");
        assert_eq!(record.ministry.as_deref(), Some("Cabinet"));
        assert_eq!(
            record.source_url,
            "https://pib.gov.in/PressReleasePage.aspx?PRID=1"
        );
        assert!(record.pdf_url.is_none());
    }

    #[test]
    fn test_merge_detail_keeps_listing_values_when_detail_is_blank() {
        let mut record = PressRelease::from_entry(&entry());
        let detail = DetailPage {
            title: Some("Cabinet approves the scheme for 2025-26".to_string()),
            pdf_url: Some(Url::parse("https://static.pib.gov.in/doc.pdf").unwrap()),
            ..DetailPage::default()
        };
        record.merge_detail(&detail);

        assert_eq!(record.title, "Cabinet approves the scheme for 2025-26");
        assert_eq!(record.ministry.as_deref(), Some("Cabinet"));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 4, 17));
        assert_eq!(
            record.pdf_url.as_deref(),
            Some("https://static.pib.gov.in/doc.pdf")
        );
    }

    #[test]
    fn test_request_validation() {
        let mut request = ScrapeRequest::new("https://www.pib.gov.in/allRel.aspx");
        assert!(request.validate().is_ok());

        request.dates = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 5, 1),
            NaiveDate::from_ymd_opt(2025, 4, 1),
        );
        assert!(matches!(
            request.validate(),
            Err(ScrapeError::InvalidRequest(_))
        ));

        let mut request = ScrapeRequest::new("ftp://example.com/list");
        assert!(request.validate().is_err());
        request.url = "not a url".to_string();
        assert!(request.validate().is_err());

        let mut request = ScrapeRequest::new("https://www.pib.gov.in/allRel.aspx");
        request.limit = Some(0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" Ministry of Finance "), Some("Ministry of Finance".to_string()));
    }

    #[test]
    fn test_report_dropped() {
        let report = RunReport {
            filtered_by_ministry: 2,
            filtered_by_date: 3,
            undated: 1,
            over_limit: 4,
            ..RunReport::default()
        };
        assert_eq!(report.dropped(), 10);
    }
}
