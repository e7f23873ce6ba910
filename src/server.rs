//! Web front end.
//!
//! | route | |
//! |-------|---|
//! | `GET /` | the form, pre-filled from the query string |
//! | `POST /scrape` | run the pipeline and show the results |
//! | `GET /runs/{id}/csv`, `GET /runs/{id}/json` | download a completed run |
//! | `GET /health` | liveness |
//!
//! Completed runs are kept in memory for download; only the most recent
//! [`MAX_STORED_RUNS`] are retained.

use crate::config::SiteProfile;
use crate::dates::parse_date;
use crate::error::ScrapeError;
use crate::filters::{DateRange, MinistryFilter};
use crate::models::{RunOutcome, ScrapeRequest};
use crate::outputs::ExportFormat;
use crate::outputs::html::{render_form_page, render_results_page};
use crate::pipeline::Pipeline;
use crate::summarizer::Summarize;
use axum::extract::{Form, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

pub const MAX_STORED_RUNS: usize = 32;

/// Raw form fields, as submitted or as found in the query string.
///
/// Checkboxes are present (`"on"`) or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeForm {
    pub url: String,
    pub ministry: String,
    pub from: String,
    pub to: String,
    pub limit: String,
    pub max_pages: String,
    pub follow_details: Option<String>,
    pub extract_pdfs: Option<String>,
    pub summarize: Option<String>,
}

impl ScrapeForm {
    /// Validate the form into a request.
    pub fn to_request(&self) -> Result<ScrapeRequest, ScrapeError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ScrapeError::InvalidRequest(
                "enter a listing, feed or press release URL".to_string(),
            ));
        }
        let request = ScrapeRequest {
            ministry: MinistryFilter::from_selection(&self.ministry),
            dates: DateRange::new(form_date("from", &self.from)?, form_date("to", &self.to)?),
            limit: form_number("limit", &self.limit)?,
            max_pages: form_number("listing pages", &self.max_pages)?.unwrap_or(1),
            follow_details: self.follow_details.is_some(),
            extract_pdfs: self.extract_pdfs.is_some(),
            summarize: self.summarize.is_some(),
            ..ScrapeRequest::new(url)
        };
        request.validate()?;
        Ok(request)
    }
}

fn form_date(field: &str, value: &str) -> Result<Option<chrono::NaiveDate>, ScrapeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_date(value)
        .map(Some)
        .ok_or_else(|| ScrapeError::InvalidRequest(format!("`{value}` is not a valid {field} date")))
}

fn form_number(field: &str, value: &str) -> Result<Option<usize>, ScrapeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ScrapeError::InvalidRequest(format!("`{value}` is not a valid {field} number")))
}

struct StoredRun {
    finished_at: NaiveDateTime,
    outcome: RunOutcome,
}

pub struct AppState<S> {
    pipeline: Arc<Pipeline<S>>,
    default_url: String,
    ministries: Vec<String>,
    runs: RwLock<BTreeMap<u64, StoredRun>>,
    next_run: AtomicU64,
}

impl<S> AppState<S> {
    pub fn new(pipeline: Pipeline<S>, profile: &SiteProfile) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            default_url: profile.default_url.clone(),
            ministries: profile.ministries.clone(),
            runs: RwLock::new(BTreeMap::new()),
            next_run: AtomicU64::new(1),
        }
    }

    fn store(&self, outcome: RunOutcome) -> u64 {
        let id = self.next_run.fetch_add(1, Ordering::Relaxed);
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        runs.insert(
            id,
            StoredRun {
                finished_at: Local::now().naive_local(),
                outcome,
            },
        );
        while runs.len() > MAX_STORED_RUNS {
            runs.pop_first();
        }
        id
    }
}

pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: Summarize + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(form_page::<S>))
        .route("/scrape", post(scrape::<S>))
        .route("/runs/{id}/csv", get(download_csv::<S>))
        .route("/runs/{id}/json", get(download_json::<S>))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve<S>(addr: SocketAddr, state: Arc<AppState<S>>) -> Result<(), Box<dyn Error>>
where
    S: Summarize + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Serving web form");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn form_page<S>(
    State(state): State<Arc<AppState<S>>>,
    Query(mut form): Query<ScrapeForm>,
) -> Html<String>
where
    S: Summarize + Send + Sync + 'static,
{
    if form.url.trim().is_empty() {
        form.url = state.default_url.clone();
    }
    Html(render_form_page(
        &form,
        &state.ministries,
        state.pipeline.can_summarize(),
        None,
    ))
}

#[instrument(level = "info", skip_all, fields(url = %form.url))]
async fn scrape<S>(State(state): State<Arc<AppState<S>>>, Form(form): Form<ScrapeForm>) -> Response
where
    S: Summarize + Send + Sync + 'static,
{
    let can_summarize = state.pipeline.can_summarize();
    let form_error = |status: StatusCode, message: String| {
        (
            status,
            Html(render_form_page(&form, &state.ministries, can_summarize, Some(&message))),
        )
            .into_response()
    };

    let request = match form.to_request() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected form");
            return form_error(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    // Summarizer futures need not be Send, so the run is driven on a blocking thread.
    let pipeline = Arc::clone(&state.pipeline);
    let handle = tokio::runtime::Handle::current();
    let joined = tokio::task::spawn_blocking(move || handle.block_on(pipeline.run(&request))).await;

    match joined {
        Ok(Ok(outcome)) => {
            let html_outcome = outcome.clone();
            let id = state.store(outcome);
            info!(run = id, kept = html_outcome.report.kept, "Stored run");
            Html(render_results_page(
                &form,
                &state.ministries,
                can_summarize,
                id,
                &html_outcome,
            ))
            .into_response()
        }
        Ok(Err(e @ ScrapeError::InvalidRequest(_))) => {
            warn!(error = %e, "Rejected request");
            form_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Run failed");
            form_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            form_error(StatusCode::INTERNAL_SERVER_ERROR, "the run was aborted".to_string())
        }
    }
}

async fn download_csv<S>(State(state): State<Arc<AppState<S>>>, Path(id): Path<u64>) -> Response {
    download(&state, id, ExportFormat::Csv)
}

async fn download_json<S>(State(state): State<Arc<AppState<S>>>, Path(id): Path<u64>) -> Response {
    download(&state, id, ExportFormat::Json)
}

fn download<S>(state: &AppState<S>, id: u64, format: ExportFormat) -> Response {
    let runs = state.runs.read().unwrap_or_else(|e| e.into_inner());
    let Some(run) = runs.get(&id) else {
        return (StatusCode::NOT_FOUND, "no such run").into_response();
    };

    match format.render(&run.outcome, run.finished_at) {
        Ok(bytes) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                format.file_name(run.finished_at)
            );
            (
                [
                    (header::CONTENT_TYPE, format.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(run = id, error = %e, "Export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "export failed").into_response()
        }
    }
}
