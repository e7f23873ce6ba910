//! Utility functions for text cleanup, retry timing and file system checks.

use chrono::NaiveDateTime;
use rand::{Rng, rng};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and the number of dropped bytes appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Shorten a string to `max` characters for display, marking the cut with `…`.
pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Collapse every run of whitespace (including newlines and NBSP) to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Delay before retry `attempt` (1-based).
///
/// ```text
/// delay = min(base * 2^(attempt-1), max) + jitter(0..=min(delay/4, 250ms))
/// ```
pub fn backoff_delay(base: Duration, max: Duration, attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    let delay = base.saturating_mul(1u32 << shift).min(max);
    let jitter_cap = (delay.as_millis() as u64 / 4).min(250);
    let jitter_ms: u64 = rng().random_range(0..=jitter_cap);
    delay + Duration::from_millis(jitter_ms)
}

/// File stem for an export written at `at`, e.g. `press_releases_2025-04-17_171200`.
pub fn export_stem(at: NaiveDateTime) -> String {
    format!("press_releases_{}", at.format("%Y-%m-%d_%H%M%S"))
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
