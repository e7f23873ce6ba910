//! Listing pages: the paginated index of press releases.
//!
//! The release index groups links under ministry headings:
//!
//! ```html
//! <div class="content-area">
//!   <ul class="num">
//!     <li>
//!       <h3>Ministry of Finance</h3>
//!       <ul>
//!         <li><a href="/PressReleasePage.aspx?PRID=2121952">GST collections …</a></li>
//!       </ul>
//!     </li>
//!   </ul>
//! </div>
//! ```
//!
//! With a group selector configured, each group's heading becomes the ministry
//! of its items. Pages without groups are read as a flat list of items.

use super::{element_text, first_text, resolve_link};
use crate::config::ListingRules;
use crate::dates::parse_date;
use crate::models::{ListingEntry, non_empty};
use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

/// Extract every release link on a listing page.
///
/// Grouped pages give each item the ministry of its group heading. When no
/// group yields an item, the page is read as a flat list. Links are resolved
/// against `page_url`; items whose link is not `http(s)` are skipped.
///
/// # Arguments
///
/// * `html` - Page source
/// * `page_url` - URL the page was fetched from
/// * `rules` - Compiled listing selectors
///
/// # Returns
///
/// Entries in page order, duplicates included. A page without matching
/// elements yields an empty list.
///
/// # Examples
///
/// ```ignore
/// let entries = parse_listing(&html, &page_url, &profile.listing);
/// ```
pub fn parse_listing(html: &str, page_url: &Url, rules: &ListingRules) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    if let Some(group_selector) = &rules.group {
        for group in document.select(group_selector) {
            let ministry = rules
                .group_heading
                .as_ref()
                .and_then(|heading| first_text(group.select(heading)));
            // `select` can match the group element itself.
            for item in group.select(&rules.item).filter(|item| item.id() != group.id()) {
                if let Some(entry) = parse_item(item, page_url, rules, ministry.clone()) {
                    entries.push(entry);
                }
            }
        }
    }

    if entries.is_empty() {
        for item in document.select(&rules.item) {
            if let Some(entry) = parse_item(item, page_url, rules, None) {
                entries.push(entry);
            }
        }
    }

    debug!(count = entries.len(), page = %page_url, "Parsed listing page");
    entries
}

/// URL of page `page` (1-based) of a listing.
///
/// Page 1 is the URL as given. Later pages set `page_param` in the query
/// string; without a page parameter there is only one page.
pub fn page_url(base: &Url, page: usize, page_param: Option<&str>) -> Option<Url> {
    if page <= 1 {
        return Some(base.clone());
    }
    let param = page_param?;
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &page.to_string());
    Some(url)
}

fn parse_item(
    item: ElementRef<'_>,
    page_url: &Url,
    rules: &ListingRules,
    ministry: Option<String>,
) -> Option<ListingEntry> {
    let link = if item.value().name() == "a" {
        item
    } else {
        item.select(&rules.link).next()?
    };
    let href = link.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let url = resolve_link(page_url, href)?;

    let link_text = element_text(link);
    let title = non_empty(&link_text).or_else(|| link.value().attr("title").and_then(non_empty))?;

    let date = rules
        .date
        .as_ref()
        .and_then(|selector| first_text(item.select(selector)))
        .and_then(|text| parse_date(&text))
        .or_else(|| {
            // Dates printed next to the link, outside the title itself.
            let item_text = element_text(item);
            parse_date(&item_text.replacen(&link_text, " ", 1))
        });

    Some(ListingEntry {
        title,
        url,
        ministry,
        date,
    })
}
