//! Press-release scrapers.
//!
//! Each source follows the same two-phase pattern:
//!
//! 1. **Indexing**: discover release links from a listing page ([`listing`]) or
//!    an RSS feed ([`feed`])
//! 2. **Fetching**: parse each press-release page ([`detail`])
//!
//! The parsers are plain functions over HTML/XML text so they can be tested
//! against fixtures; fetching is done by [`crate::fetch::Fetcher`]. Missing
//! elements never raise: they yield empty fields or no entries, and the
//! pipeline accounts for what was dropped.

use crate::utils::collapse_whitespace;
use scraper::ElementRef;
use url::Url;

pub mod detail;
pub mod feed;
pub mod listing;

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element that has any.
pub(crate) fn first_text<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    elements.map(element_text).find(|text| !text.is_empty())
}

/// Resolve `href` against `base`, keeping only `http` and `https` links.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
