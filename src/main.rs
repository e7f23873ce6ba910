//! # pib_digest
//!
//! Scrapes press releases from the Press Information Bureau site, filters them
//! by ministry and date, optionally pulls the text of their PDFs and summarizes
//! them with a language model, and exports the result as CSV or JSON.
//!
//! ## Usage
//!
//! ```sh
//! pib_digest scrape https://www.pib.gov.in/allRel.aspx --details --from 2025-04-01
//! pib_digest serve --bind 127.0.0.1:8080
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: read a listing page (with pagination) or an RSS feed
//! 2. **Fetching**: follow each release to its detail page
//! 3. **Filtering**: drop releases outside the ministry or date selection
//! 4. **Enrichment**: extract PDF text and summarize it window by window
//! 5. **Output**: terminal table plus an export file, or the web form's results page

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod dates;
mod error;
mod fetch;
mod filters;
mod models;
mod outputs;
mod pdf;
mod pipeline;
mod scrapers;
mod server;
mod summarizer;
#[cfg(test)]
mod testing;
mod utils;

use cli::{Cli, Command, ScrapeArgs, ServeArgs};
use config::SiteProfile;
use outputs::table::{render_report, render_table};
use pipeline::Pipeline;
use server::AppState;
use summarizer::{AwfulJadeSummarizer, Retrying};
use utils::ensure_writable_dir;

type ModelSummarizer = Retrying<AwfulJadeSummarizer>;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("pib_digest starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.aj_config, "Parsed CLI arguments");

    let mut profile = SiteProfile::load(args.config.as_deref())?;
    if let Some(template) = &args.template {
        profile.summary.template = template.clone();
    }

    match &args.command {
        Command::Scrape(scrape) => {
            let summarizer = if scrape.summarize {
                Some(load_summarizer(&args, &profile).await?)
            } else {
                None
            };
            run_scrape(scrape, &profile, summarizer).await?;
        }
        Command::Serve(serve) => {
            let summarizer = if serve.summarize {
                Some(load_summarizer(&args, &profile).await?)
            } else {
                None
            };
            run_server(serve, &profile, summarizer).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn load_summarizer(args: &Cli, profile: &SiteProfile) -> Result<ModelSummarizer, Box<dyn Error>> {
    let backend =
        AwfulJadeSummarizer::load(args.aj_config.as_deref(), &profile.summary.template).await?;
    Ok(Retrying::new(
        backend,
        profile.summary.retries,
        Duration::from_millis(profile.summary.backoff_ms),
    ))
}

#[instrument(level = "info", skip_all, fields(url = %args.url))]
async fn run_scrape(
    args: &ScrapeArgs,
    profile: &SiteProfile,
    summarizer: Option<ModelSummarizer>,
) -> Result<(), Box<dyn Error>> {
    // Early check: fail before a long crawl if the export cannot be written.
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let pipeline = Pipeline::new(profile, summarizer)?;
    let outcome = pipeline.run(&args.to_request()).await?;

    print!("{}", render_table(&outcome.records));
    println!("{}", render_report(&outcome.report));

    let path = outputs::export(&outcome, args.format, &args.output_dir, Local::now().naive_local()).await?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn run_server(
    args: &ServeArgs,
    profile: &SiteProfile,
    summarizer: Option<ModelSummarizer>,
) -> Result<(), Box<dyn Error>> {
    let pipeline = Pipeline::new(profile, summarizer)?;
    let state = Arc::new(AppState::new(pipeline, profile));
    server::serve(args.bind, state).await
}
