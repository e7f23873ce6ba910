//! Output generation: exports, terminal table and web pages.
//!
//! # Submodules
//!
//! - [`csv`]: spreadsheet export, one row per release
//! - [`json`]: JSON export with the run report
//! - [`table`]: fixed-width table for the terminal
//! - [`html`]: form and result pages for the web front end
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── press_releases_2025-04-17_171200.csv
//! └── press_releases_2025-04-17_173015.json
//! ```

use crate::error::ScrapeError;
use crate::models::RunOutcome;
use crate::utils::export_stem;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod csv;
pub mod html;
pub mod json;
pub mod table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    /// Download filename for a run exported at `at`.
    pub fn file_name(self, at: NaiveDateTime) -> String {
        format!("{}.{}", export_stem(at), self.extension())
    }

    /// Render a run in this format.
    pub fn render(self, outcome: &RunOutcome, at: NaiveDateTime) -> Result<Vec<u8>, ScrapeError> {
        match self {
            ExportFormat::Csv => self::csv::to_csv_bytes(&outcome.records),
            ExportFormat::Json => {
                let document = self::json::ExportDocument::new(outcome, at);
                Ok(self::json::to_json(&document)?.into_bytes())
            }
        }
    }
}

/// Write a run to `output_dir` and return the path of the new file.
///
/// # Arguments
///
/// * `outcome` - Records and run report of a finished run
/// * `format` - CSV (records only) or JSON (records plus report)
/// * `output_dir` - Existing, writable directory
/// * `at` - Export time, used in the file name and the JSON header
///
/// # Returns
///
/// `output_dir/press_releases_<YYYY-MM-DD_HHMMSS>.<csv|json>`
///
/// # Examples
///
/// ```ignore
/// let path = export(&outcome, ExportFormat::Csv, Path::new("out"), Local::now().naive_local()).await?;
/// ```
pub async fn export(
    outcome: &RunOutcome,
    format: ExportFormat,
    output_dir: &Path,
    at: NaiveDateTime,
) -> Result<PathBuf, ScrapeError> {
    let path = output_dir.join(format.file_name(at));
    match format {
        ExportFormat::Csv => self::csv::write_csv(&outcome.records, &path).await?,
        ExportFormat::Json => {
            let document = self::json::ExportDocument::new(outcome, at);
            self::json::write_json(&document, &path).await?
        }
    }
    Ok(path)
}
