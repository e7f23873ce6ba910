//! RSS listings.
//!
//! The press bureau publishes per-region and per-ministry RSS feeds. Each
//! `<item>` becomes a [`ListingEntry`]; the first `<category>`, when present,
//! is taken as the ministry.

use crate::dates::parse_rss_date;
use crate::error::ScrapeError;
use crate::models::{ListingEntry, non_empty};
use crate::scrapers::resolve_link;
use crate::utils::collapse_whitespace;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
}

/// Parse an RSS 2.0 document into listing entries.
///
/// Items without a usable link or title are skipped.
pub fn parse_feed(xml: &str, feed_url: &Url) -> Result<Vec<ListingEntry>, ScrapeError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    let total = rss.channel.items.len();

    let entries: Vec<ListingEntry> = rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let link = item.link.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
            let Some(url) = resolve_link(feed_url, link) else {
                warn!(%link, "Skipping feed item with unusable link");
                return None;
            };
            let title = item.title.as_deref().map(collapse_whitespace).and_then(non_empty)?;
            Some(ListingEntry {
                title,
                url,
                ministry: item.categories.first().and_then(non_empty),
                date: item.pub_date.as_deref().and_then(parse_rss_date),
            })
        })
        .collect();

    debug!(items = total, entries = entries.len(), feed = %feed_url, "Parsed feed");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RSS_FEED;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_feed_items() {
        let feed_url = Url::parse("https://www.pib.gov.in/RssMain.aspx?ModId=6").unwrap();
        let entries = parse_feed(RSS_FEED, &feed_url).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Cabinet approves R&D scheme");
        assert_eq!(
            entries[0].url.as_str(),
            "https://www.pib.gov.in/PressReleasePage.aspx?PRID=301"
        );
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2025, 4, 17));
        assert_eq!(entries[0].ministry.as_deref(), Some("Cabinet"));
        assert_eq!(entries[1].title, "PM to visit Varanasi");
        assert_eq!(entries[1].ministry, None);
        assert_eq!(entries[1].date, None);
    }

    #[test]
    fn test_empty_channel() {
        let feed_url = Url::parse("https://www.pib.gov.in/rss").unwrap();
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>PIB</title></channel></rss>"#;
        assert!(parse_feed(xml, &feed_url).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let feed_url = Url::parse("https://www.pib.gov.in/rss").unwrap();
        assert!(matches!(
            parse_feed("<html><body>Not a feed", &feed_url),
            Err(ScrapeError::Feed(_))
        ));
    }

    #[test]
    fn test_items_with_script_links_are_skipped() {
        let feed_url = Url::parse("https://www.pib.gov.in/rss").unwrap();
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel>
<item><title>Bad</title><link>javascript:alert(1)</link></item>
<item><title>Also bad</title><link>VBScript:msgbox(1)</link></item>
<item><title>Good</title><link>https://www.pib.gov.in/PressReleasePage.aspx?PRID=9</link></item>
</channel></rss>"#;
        let entries = parse_feed(xml, &feed_url).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Good");
    }
}
