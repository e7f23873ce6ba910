//! Parsing of the free-text publication dates found on listing and detail pages.
//!
//! Press-release pages print dates in several shapes: `17 Apr 2025`,
//! `17/04/2025`, `Posted On: 17 APR 2025 5:12PM by PIB Delhi`, or an RSS
//! `pubDate`. [`parse_date`] accepts all of them; [`format_date`] writes the
//! canonical `%d %b %Y` form, which parses back to the same calendar date.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Canonical display format.
pub const DISPLAY_FORMAT: &str = "%d %b %Y";

/// Exact formats tried before free-text scanning.
const EXACT_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
];

static ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\.?,?\s+(\d{4})\b").unwrap()
});
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b").unwrap()
});
static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})\b").unwrap());

/// Parse a date out of free text.
///
/// Tries the exact formats on the trimmed input first, then scans the text for
/// ISO, day-month-year, month-day-year and numeric `dd/mm/yyyy` dates and
/// returns the one that appears first.
/// Returns `None` when nothing in the text is a valid calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in EXACT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // Earliest match in the text wins; at the same offset, patterns are tried
    // in this order.
    [
        scan(&ISO, trimmed, |c| ymd(&c[1], &c[2], &c[3])),
        scan(&DAY_MONTH_YEAR, trimmed, |c| {
            let month = parse_month_name(&c[2])?;
            NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[1].parse().ok()?)
        }),
        scan(&MONTH_DAY_YEAR, trimmed, |c| {
            let month = parse_month_name(&c[1])?;
            NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[2].parse().ok()?)
        }),
        scan(&NUMERIC, trimmed, |c| ymd(&c[3], &c[2], &c[1])),
    ]
    .into_iter()
    .flatten()
    .min_by_key(|(offset, _)| *offset)
    .map(|(_, date)| date)
}

/// Parse an RSS `pubDate` (RFC 2822), falling back to [`parse_date`].
pub fn parse_rss_date(text: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc2822(text.trim())
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| parse_date(text))
}

/// Format a date the way the tables and exports display it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// First valid date `re` finds in `text`, with its byte offset.
fn scan<F>(re: &Regex, text: &str, build: F) -> Option<(usize, NaiveDate)>
where
    F: Fn(&Captures) -> Option<NaiveDate>,
{
    re.captures_iter(text)
        .find_map(|caps| Some((caps.get(0)?.start(), build(&caps)?)))
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Month name (full or abbreviated, any case) to its number.
fn parse_month_name(s: &str) -> Option<u32> {
    let normalized = s.to_lowercase().replace('.', "");
    match normalized.as_str() {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}
