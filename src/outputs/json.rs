//! JSON export.
//!
//! The document carries the run report next to the records, so a reader can
//! tell how many candidates were dropped and why:
//!
//! ```json
//! {
//!   "generated_at": "2025-04-17T17:12:00",
//!   "report": { "kind": "listing", "candidates": 5, "kept": 3, ... },
//!   "records": [ { "Ministry": "Ministry of Finance", "Title": "...", ... } ]
//! }
//! ```

use crate::error::ScrapeError;
use crate::models::{PressRelease, RunOutcome, RunReport};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub generated_at: NaiveDateTime,
    pub report: RunReport,
    pub records: Vec<PressRelease>,
}

impl ExportDocument {
    pub fn new(outcome: &RunOutcome, generated_at: NaiveDateTime) -> Self {
        Self {
            generated_at,
            report: outcome.report.clone(),
            records: outcome.records.clone(),
        }
    }
}

pub fn to_json(document: &ExportDocument) -> Result<String, ScrapeError> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn from_json(json: &str) -> Result<ExportDocument, ScrapeError> {
    Ok(serde_json::from_str(json)?)
}

#[instrument(level = "info", skip(document), fields(path = %path.display(), count = document.records.len()))]
pub async fn write_json(document: &ExportDocument, path: &Path) -> Result<(), ScrapeError> {
    let json = to_json(document)?;
    fs::write(path, json).await?;
    info!("Wrote JSON export");
    Ok(())
}
