//! PDF text extraction: uploaded bytes → one plain-text string.
//!
//! ## Why spawn_blocking?
//!
//! Parsing the object graph and decoding content streams is CPU-bound and
//! can take hundreds of milliseconds on a long contract.
//! `tokio::task::spawn_blocking` keeps that work off the Tokio worker
//! threads so concurrent uploads keep being accepted meanwhile.
//!
//! Pages are read in document order and their text appended to a single
//! pre-sized buffer; no separator is added beyond what the decoder emits.

use crate::error::IngestError;
use lopdf::Document;
use tracing::{debug, info};

/// Extract the text of every page, in page order, on the blocking pool.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, IngestError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
        .await
        .map_err(|e| IngestError::ExtractionFailed {
            detail: format!("Extraction task panicked: {e}"),
        })?
}

/// Blocking implementation of text extraction.
pub fn extract_text_blocking(bytes: &[u8]) -> Result<String, IngestError> {
    let document = Document::load_mem(bytes).map_err(|e| IngestError::ExtractionFailed {
        detail: e.to_string(),
    })?;

    let pages = document.get_pages();
    info!("PDF loaded: {} pages", pages.len());

    // Text is rarely larger than the file itself.
    let mut text = String::with_capacity(bytes.len().min(1 << 20));

    for page_num in pages.keys() {
        let page_text =
            document
                .extract_text(&[*page_num])
                .map_err(|e| IngestError::ExtractionFailed {
                    detail: format!("page {page_num}: {e}"),
                })?;
        debug!("Page {}: {} chars", page_num, page_text.chars().count());
        text.push_str(&page_text);
    }

    Ok(text)
}
