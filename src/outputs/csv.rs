//! CSV export, the spreadsheet-friendly format.
//!
//! One row per [`PressRelease`] under a fixed header row. Missing values are
//! empty cells. Reading a file back yields the records that were written.

use crate::error::ScrapeError;
use crate::models::PressRelease;
use std::io::Read;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Column headers, in export order.
pub const HEADERS: [&str; 7] = [
    "Ministry",
    "Title",
    "Date",
    "Source URL",
    "PDF Link",
    "PDF Text",
    "Summary",
];

/// Serialize records to CSV. The header row is written even without records.
pub fn to_csv_bytes(records: &[PressRelease]) -> Result<Vec<u8>, ScrapeError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.into_inner().map_err(|e| ScrapeError::Io(e.into_error()))
}

/// Read records from CSV produced by [`to_csv_bytes`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<PressRelease>, ScrapeError> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader
        .deserialize()
        .collect::<Result<Vec<PressRelease>, _>>()?;
    Ok(records)
}

#[instrument(level = "info", skip(records), fields(path = %path.display(), count = records.len()))]
pub async fn write_csv(records: &[PressRelease], path: &Path) -> Result<(), ScrapeError> {
    let bytes = to_csv_bytes(records)?;
    fs::write(path, bytes).await?;
    info!("Wrote CSV export");
    Ok(())
}
