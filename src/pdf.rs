//! PDF text extraction.
//!
//! Text is pulled from the document with `pdf-extract` on the blocking thread
//! pool. Scanned or image-only PDFs have no text layer and come back as `None`;
//! that is a normal outcome, not an error.

use crate::error::ScrapeError;
use crate::utils::collapse_whitespace;
use tracing::{debug, instrument};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// True when the bytes start with the PDF header (leading whitespace allowed).
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(PDF_MAGIC)
}

/// Extract the text of a downloaded PDF.
///
/// Returns `Ok(None)` when the document has no extractable text.
#[instrument(level = "info", skip(bytes), fields(bytes = bytes.len()))]
pub async fn extract_text(url: &str, bytes: Vec<u8>) -> Result<Option<String>, ScrapeError> {
    if !looks_like_pdf(&bytes) {
        return Err(ScrapeError::Pdf {
            url: url.to_string(),
            reason: "response is not a PDF document".to_string(),
        });
    }

    // The parser can panic on malformed input; a panic surfaces as a JoinError.
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ScrapeError::Pdf {
            url: url.to_string(),
            reason: format!("extractor aborted: {e}"),
        })?
        .map_err(|e| ScrapeError::Pdf {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let text = normalize_pdf_text(&extracted);
    debug!(chars = text.chars().count(), "Extracted PDF text");
    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Collapse whitespace inside each paragraph and keep paragraph breaks.
pub fn normalize_pdf_text(raw: &str) -> String {
    raw.split("\n\n")
        .map(collapse_whitespace)
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{REVIEW_PDF_LINES, pdf_document};

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(b"%PDF-1.7\n%\xe2\xe3"));
        assert!(looks_like_pdf(b"\r\n %PDF-1.4"));
        assert!(!looks_like_pdf(b"<!DOCTYPE html><html>"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn test_normalize_pdf_text() {
        let raw = "\n\nGross  GST\ncollections\n\n\n\n  rose 12%  \n\n \n";
        assert_eq!(normalize_pdf_text(raw), "Gross GST collections\n\nrose 12%");
        assert_eq!(normalize_pdf_text(" \n\n \u{a0} "), "");
    }

    #[tokio::test]
    async fn test_html_served_as_pdf_is_rejected() {
        let err = extract_text("https://example.com/a.pdf", b"<html>Moved</html>".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Pdf { .. }));
    }

    #[tokio::test]
    async fn test_truncated_pdf_is_an_error() {
        let result = extract_text("https://example.com/b.pdf", b"%PDF-1.4\n".to_vec()).await;
        assert!(matches!(result, Err(ScrapeError::Pdf { .. })));
    }

    #[tokio::test]
    async fn test_text_pdf_yields_normalized_text() {
        let text = extract_text("https://example.com/review.pdf", pdf_document(REVIEW_PDF_LINES))
            .await
            .unwrap()
            .expect("the document has a text layer");

        assert!(text.contains("Monthly Economic Review for April 2025"), "{text:?}");
        assert!(text.contains("Gross tax revenue grew in the first quarter."), "{text:?}");
        assert!(!text.contains("  "));
        assert_eq!(text, text.trim());
    }

    #[tokio::test]
    async fn test_pdf_without_text_layer_yields_none() {
        let result = extract_text("https://example.com/scan.pdf", pdf_document(&[])).await;
        assert!(matches!(result, Ok(None)), "{result:?}");
    }
}
