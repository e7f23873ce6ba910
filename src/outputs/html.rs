//! HTML pages for the web front end: the scrape form and the results table.
//!
//! Pages are plain server-rendered HTML with no scripts. Values taken from the
//! user or a scraped page are escaped with `html_escape`, and scraped links are
//! only rendered as `href`s when they are `http(s)` URLs.

use crate::dates::format_date;
use crate::models::{PressRelease, RunOutcome};
use crate::outputs::table::render_report;
use crate::server::ScrapeForm;
use crate::utils::ellipsize;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::borrow::Cow;
use std::fmt::Write;
use url::Url;

const PDF_TEXT_PREVIEW: usize = 400;

const STYLE: &str = "body{font-family:sans-serif;margin:2em;max-width:90em}\
label{display:block;margin:.4em 0}\
table{border-collapse:collapse;margin-top:1em}\
th,td{border:1px solid #ccc;padding:.3em .5em;vertical-align:top;text-align:left}\
td.summary{white-space:pre-wrap;max-width:40em}\
.error{color:#a00;font-weight:bold}\
.report{background:#f4f4f4;padding:.5em}";

/// `url` as an `href` value, or `None` unless it is an absolute `http(s)` URL.
fn web_href(url: &str) -> Option<Cow<'_, str>> {
    let parsed = Url::parse(url).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| encode_double_quoted_attribute(url))
}

/// The form, optionally with an error message above it.
pub fn render_form_page(
    form: &ScrapeForm,
    ministries: &[String],
    can_summarize: bool,
    error: Option<&str>,
) -> String {
    let mut body = String::new();
    if let Some(error) = error {
        let _ = writeln!(body, r#"<p class="error">{}</p>"#, encode_text(error));
    }
    body.push_str(&form_html(form, ministries, can_summarize));
    page("PIB press releases", &body)
}

/// The form, the run report, download links and the results table.
pub fn render_results_page(
    form: &ScrapeForm,
    ministries: &[String],
    can_summarize: bool,
    run_id: u64,
    outcome: &RunOutcome,
) -> String {
    let mut body = form_html(form, ministries, can_summarize);
    let _ = writeln!(
        body,
        r#"<p class="report">{}</p>"#,
        encode_text(&render_report(&outcome.report))
    );
    let _ = writeln!(
        body,
        r#"<p>Download: <a href="/runs/{run_id}/csv">CSV</a> · <a href="/runs/{run_id}/json">JSON</a> · <a href="{}">link to this search</a></p>"#,
        encode_double_quoted_attribute(&prefill_link(form))
    );
    body.push_str(&results_table(&outcome.records));
    page("PIB press releases: results", &body)
}

/// Link to the form pre-filled with `form`'s values.
pub fn prefill_link(form: &ScrapeForm) -> String {
    let mut pairs = vec![
        ("url", form.url.as_str()),
        ("ministry", form.ministry.as_str()),
        ("from", form.from.as_str()),
        ("to", form.to.as_str()),
        ("limit", form.limit.as_str()),
        ("max_pages", form.max_pages.as_str()),
    ];
    pairs.retain(|(_, value)| !value.trim().is_empty());
    for (name, checked) in [
        ("follow_details", form.follow_details.is_some()),
        ("extract_pdfs", form.extract_pdfs.is_some()),
        ("summarize", form.summarize.is_some()),
    ] {
        if checked {
            pairs.push((name, "on"));
        }
    }

    let query = pairs
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("/?{query}")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{}</h1>\n{body}</body>\n</html>\n",
        encode_text(title),
        encode_text(title),
    )
}

fn form_html(form: &ScrapeForm, ministries: &[String], can_summarize: bool) -> String {
    let mut out = String::new();
    out.push_str("<form method=\"post\" action=\"/scrape\">\n");
    let _ = writeln!(
        out,
        r#"<label>URL <input type="url" name="url" size="80" required value="{}"></label>"#,
        encode_double_quoted_attribute(&form.url)
    );

    out.push_str(r#"<label>Ministry <select name="ministry"><option value="">Any</option>"#);
    let selected = form.ministry.trim();
    for ministry in ministries {
        let mark = if ministry == selected { " selected" } else { "" };
        let _ = write!(
            out,
            r#"<option value="{}"{mark}>{}</option>"#,
            encode_double_quoted_attribute(ministry),
            encode_text(ministry)
        );
    }
    out.push_str("</select></label>\n");

    let _ = writeln!(
        out,
        r#"<label>From <input type="date" name="from" value="{}"></label>"#,
        encode_double_quoted_attribute(&form.from)
    );
    let _ = writeln!(
        out,
        r#"<label>To <input type="date" name="to" value="{}"></label>"#,
        encode_double_quoted_attribute(&form.to)
    );
    let _ = writeln!(
        out,
        r#"<label>Limit <input type="number" name="limit" min="1" value="{}"></label>"#,
        encode_double_quoted_attribute(&form.limit)
    );
    let _ = writeln!(
        out,
        r#"<label>Listing pages <input type="number" name="max_pages" min="1" value="{}"></label>"#,
        encode_double_quoted_attribute(&form.max_pages)
    );

    checkbox(&mut out, "follow_details", "Open each press release", form.follow_details.is_some(), true);
    checkbox(&mut out, "extract_pdfs", "Extract PDF text", form.extract_pdfs.is_some(), true);
    checkbox(&mut out, "summarize", "Summarize", form.summarize.is_some(), can_summarize);

    out.push_str("<button type=\"submit\">Scrape</button>\n</form>\n");
    out
}

fn checkbox(out: &mut String, name: &str, label: &str, checked: bool, enabled: bool) {
    let checked = if checked { " checked" } else { "" };
    let disabled = if enabled { "" } else { " disabled" };
    let _ = writeln!(
        out,
        r#"<label><input type="checkbox" name="{name}"{checked}{disabled}> {label}</label>"#
    );
}

fn results_table(records: &[PressRelease]) -> String {
    if records.is_empty() {
        return "<p>No press releases matched.</p>\n".to_string();
    }

    let mut out = String::from(
        "<table>\n<tr><th>Ministry</th><th>Date</th><th>Title</th><th>PDF</th><th>Summary</th><th>PDF Text</th></tr>\n",
    );
    for record in records {
        let ministry = record.ministry.as_deref().map(encode_text).unwrap_or_default();
        let date = record.date.map(format_date).unwrap_or_default();
        let title = match web_href(&record.source_url) {
            Some(href) => format!(r#"<a href="{href}">{}</a>"#, encode_text(&record.title)),
            None => encode_text(&record.title).into_owned(),
        };
        let pdf = record
            .pdf_url
            .as_deref()
            .and_then(web_href)
            .map(|href| format!(r#"<a href="{href}">PDF</a>"#))
            .unwrap_or_default();
        let summary = record.summary.as_deref().map(encode_text).unwrap_or_default();
        let pdf_text = record
            .pdf_text
            .as_deref()
            .map(|text| {
                format!(
                    "<details><summary>{} chars</summary>{}</details>",
                    text.chars().count(),
                    encode_text(&ellipsize(text, PDF_TEXT_PREVIEW))
                )
            })
            .unwrap_or_default();

        let _ = writeln!(
            out,
            r#"<tr><td>{ministry}</td><td>{date}</td><td>{title}</td><td>{pdf}</td><td class="summary">{summary}</td><td>{pdf_text}</td></tr>"#,
        );
    }
    out.push_str("</table>\n");
    out
}
