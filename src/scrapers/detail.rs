//! Press-release detail pages.
//!
//! A detail page carries the ministry, title and posting date of one release,
//! usually a link to the PDF version, and the release text itself.

use super::{element_text, first_text, resolve_link};
use crate::config::DetailRules;
use crate::dates::parse_date;
use crate::models::{DetailPage, non_empty};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static TITLE_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Parse one press-release page. Missing elements leave their field empty.
pub fn parse_detail(html: &str, page_url: &Url, rules: &DetailRules) -> DetailPage {
    let document = Html::parse_document(html);

    let title = first_text(document.select(&rules.title))
        .or_else(|| first_text(document.select(&TITLE_TAG)));
    let ministry = first_text(document.select(&rules.ministry));
    let date_text = first_text(document.select(&rules.date));
    let date = date_text.as_deref().and_then(parse_date);

    let pdf_url = document
        .select(&ANCHORS)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| rules.pdf_link.is_match(href))
        .find_map(|href| resolve_link(page_url, href));

    let body_text = non_empty(
        document
            .select(&rules.body)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    );

    debug!(
        page = %page_url,
        has_title = title.is_some(),
        has_ministry = ministry.is_some(),
        has_date = date.is_some(),
        has_pdf = pdf_url.is_some(),
        "Parsed detail page"
    );

    DetailPage {
        title,
        ministry,
        date_text,
        date,
        pdf_url,
        body_text,
    }
}
