//! Command-line interface definitions for pib_digest.
//!
//! Two subcommands: `scrape` runs once and writes an export, `serve` starts the
//! web form. Configuration paths can also come from environment variables.

use crate::filters::{DateRange, MinistryFilter};
use crate::models::{ScrapeRequest, TargetKind};
use crate::outputs::ExportFormat;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Scrape, filter and summarize Press Information Bureau releases.
///
/// # Examples
///
/// ```sh
/// # One release, with PDF text and a summary, written as CSV
/// pib_digest scrape "https://www.pib.gov.in/PressReleasePage.aspx?PRID=2121952" --pdf --summarize
///
/// # Three listing pages of Finance releases from April, as JSON
/// pib_digest scrape https://www.pib.gov.in/allRel.aspx --max-pages 3 \
///     --ministry Finance --from 2025-04-01 --to 2025-04-30 --details -f json -o ./out
///
/// # The web form
/// pib_digest serve --bind 127.0.0.1:8080 --summarize
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML site profile
    #[arg(short, long, env = "PIB_DIGEST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the awful_aj config.yaml (defaults to awful_aj's config directory)
    #[arg(long, env = "AJ_CONFIG", global = true)]
    pub aj_config: Option<PathBuf>,

    /// awful_aj chat template used for summaries (overrides the profile)
    #[arg(long, global = true)]
    pub template: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scrape and write an export file
    Scrape(ScrapeArgs),
    /// Serve the web form
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Listing page, RSS feed or press release URL
    pub url: String,

    /// How to read the URL (detected from the URL by default)
    #[arg(long, value_enum)]
    pub mode: Option<TargetKind>,

    /// Keep releases whose ministry contains this text
    #[arg(long)]
    pub ministry: Option<String>,

    /// Earliest release date (inclusive)
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,

    /// Latest release date (inclusive)
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,

    /// Keep at most this many releases
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Listing pages to scan
    #[arg(long, default_value_t = 1)]
    pub max_pages: usize,

    /// Open each release page for its ministry, date and PDF link
    #[arg(long)]
    pub details: bool,

    /// Extract the text of linked PDFs
    #[arg(long)]
    pub pdf: bool,

    /// Summarize each release with the configured model
    #[arg(long)]
    pub summarize: bool,

    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Output directory for the export file
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl ScrapeArgs {
    pub fn to_request(&self) -> ScrapeRequest {
        ScrapeRequest {
            kind: self.mode,
            ministry: self
                .ministry
                .as_deref()
                .map(MinistryFilter::from_selection)
                .unwrap_or_default(),
            dates: DateRange::new(self.from, self.to),
            limit: self.limit,
            max_pages: self.max_pages,
            follow_details: self.details,
            extract_pdfs: self.pdf,
            summarize: self.summarize,
            ..ScrapeRequest::new(self.url.clone())
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Load the summarization model so the form can offer summaries
    #[arg(long)]
    pub summarize: bool,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    crate::dates::parse_date(s).ok_or_else(|| format!("`{s}` is not a recognizable date"))
}
