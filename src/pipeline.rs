//! The scrape pipeline.
//!
//! ```text
//! fetch listing/feed → parse entries → pre-filter → (follow detail link)
//!   → filter → (extract PDF text) → (summarize) → records
//! ```
//!
//! Everything runs sequentially: one request, one PDF and one model call at a
//! time, and one run at a time per pipeline. A pipeline owns the session caches,
//! so pages, PDF texts and summaries fetched by one run are reused by the next.
//!
//! Per-record problems never abort a run. They are logged and counted in the
//! [`RunReport`], so the user can tell how many candidates were dropped and why.

use crate::cache::SessionCache;
use crate::config::{CompiledProfile, SiteProfile, SummarySettings};
use crate::error::ScrapeError;
use crate::fetch::Fetcher;
use crate::models::{
    DetailPage, ListingEntry, PressRelease, RunOutcome, RunReport, ScrapeRequest, TargetKind,
};
use crate::pdf;
use crate::scrapers::detail::parse_detail;
use crate::scrapers::feed::parse_feed;
use crate::scrapers::listing::{page_url, parse_listing};
use crate::summarizer::{Summarize, summarize_document};
use itertools::Itertools;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub struct Pipeline<S> {
    fetcher: Fetcher,
    profile: CompiledProfile,
    summary: SummarySettings,
    summarizer: Option<S>,
    pdf_texts: SessionCache<Option<String>>,
    summaries: SessionCache<Option<String>>,
    run_lock: Mutex<()>,
}

impl<S: Summarize> Pipeline<S> {
    pub fn new(profile: &SiteProfile, summarizer: Option<S>) -> Result<Self, ScrapeError> {
        Ok(Self {
            fetcher: Fetcher::new(&profile.http)?,
            profile: profile.compile()?,
            summary: profile.summary.clone(),
            summarizer,
            pdf_texts: SessionCache::new(),
            summaries: SessionCache::new(),
            run_lock: Mutex::new(()),
        })
    }

    /// Whether a summarization backend is configured.
    pub fn can_summarize(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Decide how to scrape a URL from the profile's URL patterns.
    pub fn classify(&self, url: &Url) -> TargetKind {
        if self.profile.detail_url.is_match(url.as_str()) {
            TargetKind::Detail
        } else if self.profile.feed_url.is_match(url.as_str()) {
            TargetKind::Feed
        } else {
            TargetKind::Listing
        }
    }

    /// Run one scrape.
    ///
    /// The URL is classified as a detail page, a feed or a listing. Listings
    /// are paginated, filtered on listing data, then optionally followed to
    /// their detail pages, filtered again, and enriched with PDF text and a
    /// summary. Runs on the same pipeline are serialized.
    ///
    /// # Arguments
    ///
    /// * `request` - What to scrape and which stages to run
    ///
    /// # Returns
    ///
    /// The kept records plus a [`RunReport`] accounting for every dropped
    /// candidate and per-record failure.
    ///
    /// # Errors
    ///
    /// Only when the request is invalid or the page the user named (the
    /// detail page, the feed, or the first listing page) cannot be loaded.
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    pub async fn run(&self, request: &ScrapeRequest) -> Result<RunOutcome, ScrapeError> {
        let url = request.validate()?;
        if request.summarize && self.summarizer.is_none() {
            return Err(ScrapeError::InvalidRequest(
                "summarization was requested but no summarizer is configured".to_string(),
            ));
        }

        let _running = self.run_lock.lock().await;
        let hits_before = self.fetcher.cache_hits();
        let kind = request.kind.unwrap_or_else(|| self.classify(&url));
        let mut report = RunReport {
            kind: Some(kind),
            ..RunReport::default()
        };
        info!(
            %kind,
            ministry = request.ministry.label(),
            filtered = request.ministry.is_active() || request.dates.is_active(),
            "Starting run"
        );

        let records = match kind {
            TargetKind::Detail => vec![self.scrape_detail(&url, request, &mut report).await?],
            TargetKind::Listing => {
                let entries = self.index_listing(&url, request, &mut report).await?;
                self.process_entries(entries, request, &mut report).await
            }
            TargetKind::Feed => {
                let entries = self.index_feed(&url, &mut report).await?;
                self.process_entries(entries, request, &mut report).await
            }
        };

        report.kept = records.len();
        report.cache_hits = self.fetcher.cache_hits() - hits_before;
        info!(
            pages = report.pages_scanned,
            candidates = report.candidates,
            kept = report.kept,
            dropped = report.dropped(),
            detail_failures = report.detail_failures,
            pdf_failures = report.pdf_failures,
            summary_failures = report.summary_failures,
            cache_hits = report.cache_hits,
            cached_pdfs = self.pdf_texts.len(),
            cached_summaries = self.summaries.len(),
            "Run complete"
        );
        Ok(RunOutcome { records, report })
    }

    /// Single-page mode: the page the user named, no filters.
    async fn scrape_detail(
        &self,
        url: &Url,
        request: &ScrapeRequest,
        report: &mut RunReport,
    ) -> Result<PressRelease, ScrapeError> {
        let detail = self.fetch_detail(url).await?;
        report.pages_scanned = 1;
        report.candidates = 1;

        let mut record = PressRelease::from_detail(url, &detail);
        self.enrich(&mut record, detail.body_text.as_deref(), request, report)
            .await;
        Ok(record)
    }

    /// Walk the listing's fixed page-number loop and collect unique entries.
    ///
    /// Stops at `max_pages`, at a page with no new entries, or once every dated
    /// entry on a page is older than the requested range (listings are newest first).
    async fn index_listing(
        &self,
        url: &Url,
        request: &ScrapeRequest,
        report: &mut RunReport,
    ) -> Result<Vec<ListingEntry>, ScrapeError> {
        let rules = &self.profile.listing;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for page in 1..=request.max_pages {
            let Some(current) = page_url(url, page, rules.page_param.as_deref()) else {
                break;
            };
            let html = match self.fetcher.get_text(&current).await {
                Ok(html) => html,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(page, url = %current, error = %e, "Listing page failed; stopping pagination");
                    break;
                }
            };
            report.pages_scanned += 1;

            let parsed = parse_listing(&html, &current, rules);
            let all_older = request.dates.from.is_some_and(|from| {
                let mut dates = parsed.iter().filter_map(|e| e.date).peekable();
                dates.peek().is_some() && dates.all(|date| date < from)
            });

            let before = entries.len();
            entries.extend(
                parsed
                    .into_iter()
                    .filter(|entry| seen.insert(entry.url.to_string())),
            );
            let added = entries.len() - before;
            debug!(page, added, total = entries.len(), "Indexed listing page");

            if added == 0 {
                debug!(page, "No new entries; end of listing");
                break;
            }
            if all_older {
                debug!(page, "Listing is older than the requested range");
                break;
            }
        }

        info!(count = entries.len(), pages = report.pages_scanned, "Indexed listing");
        Ok(entries)
    }

    async fn index_feed(
        &self,
        url: &Url,
        report: &mut RunReport,
    ) -> Result<Vec<ListingEntry>, ScrapeError> {
        let xml = self.fetcher.get_text(url).await?;
        report.pages_scanned = 1;
        let entries = parse_feed(&xml, url)?
            .into_iter()
            .unique_by(|entry| entry.url.clone())
            .collect::<Vec<_>>();
        info!(count = entries.len(), "Indexed feed");
        Ok(entries)
    }

    async fn process_entries(
        &self,
        entries: Vec<ListingEntry>,
        request: &ScrapeRequest,
        report: &mut RunReport,
    ) -> Vec<PressRelease> {
        report.candidates = entries.len();
        let mut records = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            if request.limit.is_some_and(|limit| records.len() >= limit) {
                report.over_limit = entries.len() - index;
                debug!(limit = ?request.limit, skipped = report.over_limit, "Limit reached");
                break;
            }

            // Listing data is enough to reject some entries without fetching them.
            if entry
                .ministry
                .as_deref()
                .is_some_and(|ministry| !request.ministry.matches_ministry(ministry))
            {
                report.filtered_by_ministry += 1;
                continue;
            }
            if entry.date.is_some_and(|date| !request.dates.contains(date)) {
                report.filtered_by_date += 1;
                continue;
            }

            let mut record = PressRelease::from_entry(entry);
            let mut body = None;
            if request.follow_details {
                match self.fetch_detail(&entry.url).await {
                    Ok(detail) => {
                        record.merge_detail(&detail);
                        body = detail.body_text;
                    }
                    Err(e) => {
                        report.detail_failures += 1;
                        warn!(url = %entry.url, error = %e, "Detail page failed; keeping listing data");
                    }
                }
            }

            if !request
                .ministry
                .matches(record.ministry.as_deref(), &record.title)
            {
                report.filtered_by_ministry += 1;
                continue;
            }
            if request.dates.is_active() {
                match record.date {
                    None => {
                        report.undated += 1;
                        debug!(url = %record.source_url, "No parsable date; dropped");
                        continue;
                    }
                    Some(date) if !request.dates.contains(date) => {
                        report.filtered_by_date += 1;
                        continue;
                    }
                    Some(_) => {}
                }
            }

            self.enrich(&mut record, body.as_deref(), request, report)
                .await;
            records.push(record);
        }

        records
    }

    async fn fetch_detail(&self, url: &Url) -> Result<DetailPage, ScrapeError> {
        let html = self.fetcher.get_text(url).await?;
        let detail = parse_detail(&html, url, &self.profile.detail);
        if let (None, Some(date_text)) = (detail.date, &detail.date_text) {
            debug!(%url, %date_text, "Unrecognized date on detail page");
        }
        Ok(detail)
    }

    /// Optional stages: PDF text, then a summary of the PDF text (or of the
    /// page body when there is no PDF text).
    async fn enrich(
        &self,
        record: &mut PressRelease,
        body: Option<&str>,
        request: &ScrapeRequest,
        report: &mut RunReport,
    ) {
        if request.extract_pdfs {
            if let Some(pdf_url) = record.pdf_url.clone() {
                match self.pdf_text(&pdf_url).await {
                    Ok(Some(text)) => record.pdf_text = Some(text),
                    Ok(None) => {
                        report.pdfs_without_text += 1;
                        info!(%pdf_url, "PDF has no extractable text");
                    }
                    Err(e) => {
                        report.pdf_failures += 1;
                        warn!(%pdf_url, error = %e, "PDF extraction failed");
                    }
                }
            }
        }

        if !request.summarize {
            return;
        }
        let Some(summarizer) = &self.summarizer else {
            return;
        };
        let (source, text) = match (record.pdf_text.as_deref(), body) {
            (Some(text), _) => ("pdf", text),
            (None, Some(text)) => ("body", text),
            (None, None) => {
                debug!(url = %record.source_url, "Nothing to summarize");
                return;
            }
        };

        let key = format!("{}|{}|{}", record.source_url, source, text.len());
        if let Some(summary) = self.summaries.get(&key) {
            record.summary = summary;
            return;
        }
        match summarize_document(summarizer, text, &self.summary).await {
            Ok(summary) => {
                self.summaries.insert(key, summary.clone());
                record.summary = summary;
            }
            Err(e) => {
                report.summary_failures += 1;
                warn!(url = %record.source_url, error = %e, "Summary failed");
            }
        }
    }

    async fn pdf_text(&self, pdf_url: &str) -> Result<Option<String>, ScrapeError> {
        if let Some(text) = self.pdf_texts.get(pdf_url) {
            return Ok(text);
        }
        let url = Url::parse(pdf_url).map_err(|e| ScrapeError::InvalidUrl(format!("{pdf_url}: {e}")))?;
        let bytes = self.fetcher.get_bytes(&url).await?;
        let text = pdf::extract_text(pdf_url, bytes).await?;
        self.pdf_texts.insert(pdf_url, text.clone());
        Ok(text)
    }
}
