//! Fixed-width text table for the terminal.

use crate::dates::format_date;
use crate::models::{PressRelease, RunReport};
use crate::utils::ellipsize;
use std::fmt::Write;

const MINISTRY_WIDTH: usize = 28;
const DATE_WIDTH: usize = 11;
const TITLE_WIDTH: usize = 60;

/// Render records as a table with Ministry, Date, Title, PDF and Summary columns.
///
/// Long cells are cut with `…`; the PDF and Summary columns only mark presence.
pub fn render_table(records: &[PressRelease]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<mw$}  {:<dw$}  {:<tw$}  {:<3}  {}",
        "Ministry",
        "Date",
        "Title",
        "PDF",
        "Summary",
        mw = MINISTRY_WIDTH,
        dw = DATE_WIDTH,
        tw = TITLE_WIDTH,
    );
    let _ = writeln!(
        out,
        "{}",
        "-".repeat(MINISTRY_WIDTH + DATE_WIDTH + TITLE_WIDTH + 3 + 7 + 8)
    );

    for record in records {
        let _ = writeln!(
            out,
            "{:<mw$}  {:<dw$}  {:<tw$}  {:<3}  {}",
            ellipsize(record.ministry.as_deref().unwrap_or("-"), MINISTRY_WIDTH),
            record.date.map(format_date).unwrap_or_else(|| "-".to_string()),
            ellipsize(&record.title, TITLE_WIDTH),
            mark(record.pdf_url.is_some()),
            mark(record.summary.is_some()),
            mw = MINISTRY_WIDTH,
            dw = DATE_WIDTH,
            tw = TITLE_WIDTH,
        );
    }

    if records.is_empty() {
        out.push_str("(no press releases matched)\n");
    }
    out
}

/// One-paragraph account of a run.
pub fn render_report(report: &RunReport) -> String {
    let mut out = format!(
        "Scanned {} page(s): {} candidate(s), {} kept, {} dropped",
        report.pages_scanned,
        report.candidates,
        report.kept,
        report.dropped()
    );
    let reasons = [
        ("other ministry", report.filtered_by_ministry),
        ("outside date range", report.filtered_by_date),
        ("undated", report.undated),
        ("over limit", report.over_limit),
    ];
    let dropped: Vec<String> = reasons
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(reason, n)| format!("{n} {reason}"))
        .collect();
    if !dropped.is_empty() {
        let _ = write!(out, " ({})", dropped.join(", "));
    }
    out.push('.');

    let problems = [
        ("detail page(s) failed", report.detail_failures),
        ("PDF(s) failed", report.pdf_failures),
        ("PDF(s) without text", report.pdfs_without_text),
        ("summary(ies) failed", report.summary_failures),
    ];
    for (label, n) in problems.iter().filter(|(_, n)| *n > 0) {
        let _ = write!(out, " {n} {label}.");
    }
    if report.cache_hits > 0 {
        let _ = write!(out, " {} page(s) served from cache.", report.cache_hits);
    }
    out
}

fn mark(present: bool) -> &'static str {
    if present { "yes" } else { "-" }
}
