//! Site profile configuration.
//!
//! Selectors, URL patterns and HTTP/summary settings live in an optional YAML
//! file. Every field has a default matching the Press Information Bureau site,
//! so a profile only needs to name what it overrides:
//!
//! ```yaml
//! listing:
//!   page_param: pageno
//! http:
//!   request_delay_ms: 1000
//! summary:
//!   chunk_chars: 1500
//! ```
//!
//! [`SiteProfile::compile`] turns the strings into [`Selector`]s and [`Regex`]es
//! once, so a typo fails at startup instead of silently matching nothing.

use crate::error::ScrapeError;
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteProfile {
    /// URL pre-filled in the form.
    pub default_url: String,
    /// URLs matching this pattern are single press-release pages.
    pub detail_url_pattern: String,
    /// URLs matching this pattern are RSS feeds.
    pub feed_url_pattern: String,
    pub listing: ListingConfig,
    pub detail: DetailConfig,
    /// Ministry choices offered by the form.
    pub ministries: Vec<String>,
    pub http: HttpSettings,
    pub summary: SummarySettings,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            default_url: "https://www.pib.gov.in/PressReleasePage.aspx?PRID=2121952".to_string(),
            detail_url_pattern: r"(?i)PressRele\w*\.aspx\?PRID=\d+".to_string(),
            feed_url_pattern: r"(?i)(rss|\.xml$)".to_string(),
            listing: ListingConfig::default(),
            detail: DetailConfig::default(),
            ministries: [
                "Prime Minister's Office",
                "Ministry of Finance",
                "Ministry of Defence",
                "Ministry of Home Affairs",
                "Ministry of External Affairs",
                "Ministry of Health and Family Welfare",
                "Ministry of Education",
                "Ministry of Agriculture & Farmers Welfare",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            http: HttpSettings::default(),
            summary: SummarySettings::default(),
        }
    }
}

/// Selectors for listing pages.
///
/// With `group_selector` set, each group's heading names the ministry of the
/// items inside it. Without it, `item_selector` runs against the whole page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListingConfig {
    pub group_selector: Option<String>,
    pub group_heading_selector: Option<String>,
    pub item_selector: String,
    pub link_selector: String,
    pub date_selector: Option<String>,
    /// Query parameter carrying the page number; `None` disables pagination.
    pub page_param: Option<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            group_selector: Some(".content-area ul.num > li".to_string()),
            group_heading_selector: Some("h3".to_string()),
            item_selector: "ul li".to_string(),
            link_selector: "a[href]".to_string(),
            date_selector: Some(".publishdatesmall".to_string()),
            page_param: Some("page".to_string()),
        }
    }
}

/// Selectors for press-release detail pages.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetailConfig {
    pub title_selector: String,
    pub ministry_selector: String,
    pub date_selector: String,
    pub body_selector: String,
    /// Regex applied to every `href` on the page; the first match is the PDF.
    pub pdf_link_pattern: String,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            title_selector: "span#lblTitle, .innner-page-main-about-us-content-right-part h2"
                .to_string(),
            ministry_selector: "span#lblMinistry, .MinistryNameSubhead".to_string(),
            date_selector: "span#lblDate, .ReleaseDateSubHeaddateTime".to_string(),
            body_selector: "#PdfDiv, .innner-page-main-about-us-content-right-part p".to_string(),
            pdf_link_pattern: r"(?i)\.pdf\b".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Extra attempts for transient failures.
    pub retries: usize,
    pub backoff_ms: u64,
    /// Pause after every request that reached the network.
    pub request_delay_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("pib_digest/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            retries: 2,
            backoff_ms: 500,
            request_delay_ms: 250,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Window size in characters.
    pub chunk_chars: usize,
    /// Only the first `max_chunks` windows are summarized.
    pub max_chunks: Option<usize>,
    /// Shorter texts are left unsummarized.
    pub min_chars: usize,
    /// awful_aj chat template name.
    pub template: String,
    pub retries: usize,
    pub backoff_ms: u64,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            chunk_chars: 1000,
            max_chunks: Some(8),
            min_chars: 200,
            template: "press_release_summary".to_string(),
            retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl SiteProfile {
    /// Load a profile from YAML, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ScrapeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let profile = Self::from_yaml(&yaml)?;
        info!(path = %path.display(), "Loaded site profile");
        Ok(profile)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ScrapeError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Compile selectors and patterns.
    pub fn compile(&self) -> Result<CompiledProfile, ScrapeError> {
        let listing = &self.listing;
        let detail = &self.detail;
        Ok(CompiledProfile {
            detail_url: regex(&self.detail_url_pattern)?,
            feed_url: regex(&self.feed_url_pattern)?,
            listing: ListingRules {
                group: listing.group_selector.as_deref().map(selector).transpose()?,
                group_heading: listing
                    .group_heading_selector
                    .as_deref()
                    .map(selector)
                    .transpose()?,
                item: selector(&listing.item_selector)?,
                link: selector(&listing.link_selector)?,
                date: listing.date_selector.as_deref().map(selector).transpose()?,
                page_param: listing.page_param.clone().filter(|p| !p.trim().is_empty()),
            },
            detail: DetailRules {
                title: selector(&detail.title_selector)?,
                ministry: selector(&detail.ministry_selector)?,
                date: selector(&detail.date_selector)?,
                body: selector(&detail.body_selector)?,
                pdf_link: regex(&detail.pdf_link_pattern)?,
            },
        })
    }
}

/// A [`SiteProfile`] with every selector and pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub detail_url: Regex,
    pub feed_url: Regex,
    pub listing: ListingRules,
    pub detail: DetailRules,
}

#[derive(Debug, Clone)]
pub struct ListingRules {
    pub group: Option<Selector>,
    pub group_heading: Option<Selector>,
    pub item: Selector,
    pub link: Selector,
    pub date: Option<Selector>,
    pub page_param: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetailRules {
    pub title: Selector,
    pub ministry: Selector,
    pub date: Selector,
    pub body: Selector,
    pub pdf_link: Regex,
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn regex(pattern: &str) -> Result<Regex, ScrapeError> {
    Regex::new(pattern).map_err(|e| ScrapeError::Selector {
        selector: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_compiles() {
        let compiled = SiteProfile::default().compile().unwrap();
        assert!(compiled
            .detail_url
            .is_match("https://www.pib.gov.in/PressReleasePage.aspx?PRID=2121952"));
        assert!(compiled
            .detail_url
            .is_match("https://pib.gov.in/PressReleseDetail.aspx?PRID=1"));
        assert!(compiled
            .feed_url
            .is_match("https://pib.gov.in/RssMain.aspx?ModId=6&Lang=1&Regid=3"));
        assert!(!compiled.feed_url.is_match("https://www.pib.gov.in/allRel.aspx"));
        assert_eq!(compiled.listing.page_param.as_deref(), Some("page"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
listing:
  page_param: pageno
  group_selector: null
http:
  request_delay_ms: 0
summary:
  chunk_chars: 1500
"#;
        let profile = SiteProfile::from_yaml(yaml).unwrap();
        assert_eq!(profile.listing.page_param.as_deref(), Some("pageno"));
        assert_eq!(profile.listing.group_selector, None);
        assert_eq!(profile.listing.item_selector, "ul li");
        assert_eq!(profile.http.request_delay_ms, 0);
        assert_eq!(profile.http.timeout_secs, 30);
        assert_eq!(profile.summary.chunk_chars, 1500);
        assert_eq!(profile.summary.min_chars, 200);
        assert_eq!(profile.ministries, SiteProfile::default().ministries);
    }

    #[test]
    fn test_bad_selector_fails_compile() {
        let mut profile = SiteProfile::default();
        profile.detail.title_selector = "span[".to_string();
        match profile.compile() {
            Err(ScrapeError::Selector { selector, .. }) => assert_eq!(selector, "span["),
            other => panic!("expected selector error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_page_param_disables_pagination() {
        let mut profile = SiteProfile::default();
        profile.listing.page_param = Some("  ".to_string());
        assert!(profile.compile().unwrap().listing.page_param.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.yaml");
        std::fs::write(&path, "ministries: [\"Ministry of Coal\"]\n").unwrap();

        let profile = SiteProfile::load(Some(&path)).unwrap();
        assert_eq!(profile.ministries, vec!["Ministry of Coal".to_string()]);

        let missing = SiteProfile::load(Some(&dir.path().join("nope.yaml")));
        assert!(matches!(missing, Err(ScrapeError::Config(_))));
        assert_eq!(SiteProfile::load(None).unwrap(), SiteProfile::default());
    }
}
