//! Test fixtures: a local imitation of the press bureau site and a scripted
//! summarizer.

use crate::config::{HttpSettings, SiteProfile, SummarySettings};
use crate::error::ScrapeError;
use crate::summarizer::Summarize;
use axum::Router;
use axum::extract::{Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

struct Release {
    prid: u32,
    ministry: &'static str,
    title: &'static str,
    posted: &'static str,
    pdf: Option<&'static str>,
    body: &'static str,
}

const RELEASES: &[Release] = &[
    Release {
        prid: 101,
        ministry: "Ministry of Finance",
        title: "GST collections rise in April",
        posted: "Posted On: 17 APR 2025 5:12PM by PIB Delhi",
        pdf: Some("/docs/broken.pdf"),
        body: "Gross GST collections for April 2025 stood at a record high, \
               growing 12.6% year on year on the back of strong domestic transactions.",
    },
    Release {
        prid: 102,
        ministry: "Ministry of Finance",
        title: "Finance Minister meets bank chiefs",
        posted: "Posted On: 10 APR 2025 3:00PM by PIB Delhi",
        pdf: None,
        body: "The Finance Minister reviewed the performance of public sector banks \
               and asked them to widen credit access for small businesses.",
    },
    Release {
        prid: 103,
        ministry: "Ministry of Defence",
        title: "Exercise concludes at sea",
        posted: "Posted On: 02 MAR 2025 6:40PM by PIB Delhi",
        pdf: None,
        body: "A joint naval exercise concluded off the western coast after ten days \
               of drills involving ships and aircraft.",
    },
    Release {
        prid: 104,
        ministry: "Ministry of Finance",
        title: "Monthly economic review",
        posted: "Posted On: 22 APR 2025 4:00PM by PIB Delhi",
        pdf: Some("/docs/review.pdf"),
        body: "The review is attached.",
    },
    Release {
        prid: 105,
        ministry: "Ministry of Finance",
        title: "Signed notification",
        posted: "Posted On: 23 APR 2025 10:00AM by PIB Delhi",
        pdf: Some("/docs/scan.pdf"),
        body: "The notification is attached as a scanned copy.",
    },
    Release {
        prid: 201,
        ministry: "Ministry of Finance",
        title: "Budget session highlights",
        posted: "Posted On: 05 APR 2025 11:00AM by PIB Delhi",
        pdf: None,
        body: "The budget session of Parliament concluded with the passage of the \
               Finance Bill and the Appropriation Bills.",
    },
    Release {
        prid: 202,
        ministry: "Ministry of Health and Family Welfare",
        title: "Vaccination drive expands",
        posted: "Posted On: 01 APR 2025 9:30AM by PIB Delhi",
        pdf: None,
        body: "The national vaccination drive now covers adolescents in every district.",
    },
    Release {
        prid: 301,
        ministry: "Cabinet Secretariat",
        title: "Cabinet approves R&D scheme",
        posted: "Posted On: 17 APR 2025 5:12PM by PIB Delhi",
        pdf: None,
        body: "The Union Cabinet approved a scheme to fund research and development \
               in the private sector.",
    },
];

/// HTML of the detail page for a release id listed in the fixtures.
pub fn detail_page(prid: u32) -> String {
    let release = RELEASES
        .iter()
        .find(|r| r.prid == prid)
        .unwrap_or_else(|| panic!("no fixture for PRID={prid}"));
    render_detail(release)
}

fn render_detail(release: &Release) -> String {
    let pdf = release
        .pdf
        .map(|href| format!(r#"<a href="{href}">Download PDF</a>"#))
        .unwrap_or_default();
    format!(
        r#"<html>
<head><title>Press Release: Press Information Bureau</title></head>
<body>
  <div class="innner-page-main-about-us-content-right-part">
    <div class="MinistryNameSubhead">{ministry}</div>
    <h2>{title}</h2>
    <div class="ReleaseDateSubHeaddateTime">{posted}</div>
    {pdf}
    <div id="PdfDiv">{body}</div>
  </div>
</body>
</html>"#,
        ministry = release.ministry,
        title = release.title.replace('&', "&amp;"),
        posted = release.posted,
        body = release.body,
    )
}

fn listing_item(prid: u32, title: &str, date: Option<&str>) -> String {
    let date = date
        .map(|d| format!(r#" <span class="publishdatesmall">{d}</span>"#))
        .unwrap_or_default();
    format!(r#"<li><a href="/PressReleasePage.aspx?PRID={prid}">{title}</a>{date}</li>"#)
}

fn listing_group(ministry: &str, items: &[String]) -> String {
    format!("<li><h3>{ministry}</h3><ul>{}</ul></li>", items.concat())
}

/// Page `page` of the grouped release index. Pages after 2 are empty; page 2
/// repeats one release from page 1.
pub fn grouped_listing(page: usize) -> String {
    let groups = match page {
        1 => vec![
            listing_group(
                "Ministry of Finance",
                &[
                    listing_item(101, "GST collections rise in April", Some("17 Apr 2025")),
                    listing_item(102, "Finance Minister meets bank chiefs", Some("10 Apr 2025")),
                ],
            ),
            listing_group(
                "Ministry of Defence",
                &[listing_item(103, "Exercise concludes at sea", Some("02/03/2025"))],
            ),
        ],
        2 => vec![
            listing_group(
                "Ministry of Finance",
                &[
                    listing_item(201, "Budget session highlights", Some("05 Apr 2025")),
                    listing_item(101, "GST collections rise in April", Some("17 Apr 2025")),
                ],
            ),
            listing_group(
                "Ministry of Health and Family Welfare",
                &[listing_item(202, "Vaccination drive expands", None)],
            ),
        ],
        _ => Vec::new(),
    };
    format!(
        r#"<html><body><div class="content-area"><ul class="num">{}</ul></div></body></html>"#,
        groups.concat()
    )
}

pub const FLAT_LISTING: &str = r#"<html><body>
<ul class="releases">
  <li><a href="/PressReleasePage.aspx?PRID=401">Coal production crosses one billion tonnes</a> <span>01/04/2025</span></li>
  <li><a href="/PressReleasePage.aspx?PRID=402" title="Railways adds new Vande Bharat services"></a></li>
</ul>
</body></html>"#;

pub const EMPTY_LISTING: &str = r#"<html><body>
<div class="content-area"><ul class="num"></ul><p>No releases found.</p></div>
</body></html>"#;

pub const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>PIB - Press Releases</title>
    <link>https://www.pib.gov.in</link>
    <description>Latest press releases</description>
    <item>
      <title><![CDATA[Cabinet approves R&D scheme]]></title>
      <link>/PressReleasePage.aspx?PRID=301</link>
      <pubDate>Thu, 17 Apr 2025 17:12:00 +0530</pubDate>
      <category>Cabinet</category>
    </item>
    <item>
      <title>PM to visit Varanasi</title>
      <link>/PressReleasePage.aspx?PRID=302</link>
    </item>
  </channel>
</rss>"#;

/// Lines of the text PDF served at `/docs/review.pdf`.
pub const REVIEW_PDF_LINES: &[&str] = &[
    "Monthly Economic Review for April 2025",
    "Gross tax revenue grew in the first quarter.",
];

/// A one-page PDF showing `lines` in Helvetica. With no lines the page has no
/// text layer, like a scanned document.
pub fn pdf_document(lines: &[&str]) -> Vec<u8> {
    let mut content = String::new();
    if !lines.is_empty() {
        content.push_str("BT\n/F1 12 Tf\n14 TL\n72 720 Td\n");
        for line in lines {
            let escaped = line.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)");
            let _ = writeln!(content, "({escaped}) Tj T*");
        }
        content.push_str("ET\n");
    }

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}endstream", content.len()),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        let _ = write!(pdf, "{} 0 obj\n{object}\nendobj\n", i + 1);
    }
    let xref = pdf.len();
    let _ = write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(pdf, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%EOF\n",
        objects.len() + 1
    );
    pdf.into_bytes()
}

/// Profile for tests: no politeness delay, no retries, every text summarized
/// in one window.
pub fn test_profile() -> SiteProfile {
    SiteProfile {
        http: HttpSettings {
            retries: 0,
            backoff_ms: 1,
            request_delay_ms: 0,
            ..HttpSettings::default()
        },
        summary: SummarySettings {
            chunk_chars: 2000,
            max_chunks: None,
            min_chars: 0,
            ..SummarySettings::default()
        },
        ..SiteProfile::default()
    }
}

type Hits = Arc<Mutex<HashMap<String, usize>>>;

/// Local HTTP server serving the fixtures, with per-path request counts.
///
/// | path | response |
/// |------|----------|
/// | `/allRel.aspx?page=N` | [`grouped_listing`] |
/// | `/empty.aspx` | [`EMPTY_LISTING`] |
/// | `/PressReleasePage.aspx?PRID=N` | [`detail_page`], 404 for unknown ids |
/// | `/rss` | [`RSS_FEED`] |
/// | `/docs/broken.pdf` | an HTML page labelled as PDF |
/// | `/docs/review.pdf` | [`pdf_document`] of [`REVIEW_PDF_LINES`] |
/// | `/docs/scan.pdf` | a PDF without text |
/// | `/flaky` | always 503 |
/// | anything else | 404 |
pub struct FakeSite {
    addr: SocketAddr,
    hits: Hits,
}

impl FakeSite {
    pub async fn start() -> Self {
        let hits = Hits::default();
        let app = Router::new()
            .route("/allRel.aspx", get(listing))
            .route("/empty.aspx", get(|| async { Html(EMPTY_LISTING) }))
            .route("/PressReleasePage.aspx", get(release))
            .route(
                "/rss",
                get(|| async { ([(header::CONTENT_TYPE, "application/rss+xml")], RSS_FEED) }),
            )
            .route(
                "/docs/broken.pdf",
                get(|| async {
                    (
                        [(header::CONTENT_TYPE, "application/pdf")],
                        "<html><body>Document moved</body></html>",
                    )
                }),
            )
            .route("/docs/review.pdf", get(|| async { pdf_response(REVIEW_PDF_LINES) }))
            .route("/docs/scan.pdf", get(|| async { pdf_response(&[]) }))
            .route("/flaky", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, hits }
    }

    /// Absolute URL of `path_and_query` on this site.
    pub fn url(&self, path_and_query: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path_and_query)).unwrap()
    }

    /// Requests received for `path`, any query string.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn count_hits(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    *hits
        .lock()
        .unwrap()
        .entry(request.uri().path().to_string())
        .or_default() += 1;
    next.run(request).await
}

fn pdf_response(lines: &[&str]) -> Response {
    ([(header::CONTENT_TYPE, "application/pdf")], pdf_document(lines)).into_response()
}

async fn listing(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    let page = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    Html(grouped_listing(page))
}

async fn release(Query(params): Query<HashMap<String, String>>) -> Response {
    let found = params
        .get("PRID")
        .and_then(|p| p.parse::<u32>().ok())
        .and_then(|prid| RELEASES.iter().find(|r| r.prid == prid));
    match found {
        Some(release) => Html(render_detail(release)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A [`Summarize`] that wraps its input in angle brackets and fails on request.
#[derive(Debug, Default)]
pub struct ScriptedSummarizer {
    calls: AtomicUsize,
    fail_first: usize,
    fail_on: Option<String>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` calls.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Fail every call whose text contains `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Summarize for ScriptedSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, ScrapeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_first {
            return Err(ScrapeError::Summarizer(format!("scripted failure #{call}")));
        }
        if self.fail_on.as_deref().is_some_and(|needle| text.contains(needle)) {
            return Err(ScrapeError::Summarizer("scripted failure on text".to_string()));
        }
        Ok(format!("<{text}>"))
    }
}
