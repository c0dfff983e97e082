//! PDF extraction with three escalating tiers
//!
//! 1. the embedded text layer via pdf-extract (bounded by a timeout),
//! 2. a layout-aware lopdf content-stream parse, which also finds tables,
//! 3. rendering pages with pdftoppm and running tesseract on each one.
//!
//! A tier is only tried when the previous one produced unusable text.

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use lopdf::{Document, Object};
use serde_json::json;

use super::layout::{self, PageLayout};
use super::ocr::OcrEngine;
use super::text::{calculate_confidence, clean_text, detect_language, needs_ocr};
use crate::config::{ClassifierConfig, ExtractionConfig};
use crate::error::ExtractionError;
use crate::types::{ExtractedContent, Metadata, Table};

/// Info dictionary keys and the metadata names they are stored under
const INFO_FIELDS: &[(&[u8], &str)] = &[
    (b"Author", "author"),
    (b"Creator", "creator"),
    (b"Producer", "producer"),
    (b"Subject", "subject"),
    (b"Title", "title"),
    (b"CreationDate", "creation_date"),
    (b"ModDate", "modification_date"),
];

/// Extractor for `application/pdf`
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    settings: ExtractionConfig,
    ocr: OcrEngine,
}

impl PdfExtractor {
    pub const MIME_TYPES: &'static [&'static str] = &[super::mime::PDF];

    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            settings: config.extraction.clone(),
            ocr: OcrEngine::new(config.ocr.clone()),
        }
    }

    pub fn extract_content(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let data = std::fs::read(path).map_err(|e| ExtractionError::read(path, e))?;
        let doc = Document::load_mem(&data)
            .map_err(|e| ExtractionError::parse("PDF", format!("failed to load document: {}", e)))?;

        let pages = layout::parse_pages(&doc);
        let threshold = self.settings.ocr_alnum_threshold;

        let mut tables: Vec<Table> = Vec::new();
        let (raw_text, tier) = match self.text_layer(&data) {
            Some(text) if !needs_ocr(&text, threshold) => (text, 1),
            _ => {
                tracing::warn!("PDF text layer unusable, trying layout parse");
                let layout_text = pages
                    .iter()
                    .map(PageLayout::text)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                tables = pages.iter().flat_map(PageLayout::tables).collect();

                if !needs_ocr(&layout_text, threshold) {
                    (layout_text, 2)
                } else {
                    tracing::warn!("PDF layout parse produced no usable text, falling back to OCR");
                    match self.ocr_pages(path) {
                        Ok(ocr_text) => (ocr_text, 3),
                        Err(e) if !layout_text.trim().is_empty() => {
                            tracing::warn!("PDF OCR failed, keeping layout text: {}", e);
                            (layout_text, 2)
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        };

        let (headers, footers) = self.margins(&pages);

        let mut metadata = document_metadata(&doc);
        metadata.insert("extraction_tier".to_string(), json!(tier));

        let text = clean_text(&raw_text);
        tracing::debug!(
            pages = pages.len(),
            tier,
            chars = text.len(),
            tables = tables.len(),
            "PDF extracted"
        );

        Ok(ExtractedContent::new(text.clone())
            .with_metadata(metadata)
            .with_tables(tables)
            .with_headers(headers)
            .with_footers(footers)
            .with_language(detect_language(&text))
            .with_confidence(calculate_confidence(&raw_text)))
    }

    pub fn validate_file(&self, path: &Path) -> bool {
        Document::load(path).is_ok()
    }

    /// Tier 1: pdf-extract in a worker thread so a hang or panic on a
    /// problematic font cannot take the call down with it
    fn text_layer(&self, data: &[u8]) -> Option<String> {
        let data = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data);
            let _ = tx.send(result);
        });

        let timeout = Duration::from_secs(self.settings.text_layer_timeout_secs);
        match rx.recv_timeout(timeout) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Some(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed: {}", e);
                None
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is detached and finishes on its own
                tracing::error!("PDF text layer timed out after {:?}", timeout);
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF text layer thread crashed");
                None
            }
        }
    }

    /// Tier 3: render each page and OCR it; artifacts live in a temp dir
    fn ocr_pages(&self, path: &Path) -> Result<String, ExtractionError> {
        let work_dir = tempfile::tempdir()
            .map_err(|e| ExtractionError::ocr(format!("failed to create temp dir: {}", e)))?;

        let images = self.ocr.render_pdf_pages(path, work_dir.path())?;
        let mut text = String::new();
        for (i, image) in images.iter().enumerate() {
            let page_text = self.ocr.recognize_text(image)?;
            tracing::debug!(page = i + 1, chars = page_text.len(), "OCR page done");
            text.push_str(&page_text);
            text.push('\n');
        }

        tracing::info!("OCR extracted {} characters from {} pages", text.len(), images.len());
        Ok(text)
    }

    /// One header and one footer snippet per page, when the band has text
    fn margins(&self, pages: &[PageLayout]) -> (Vec<String>, Vec<String>) {
        let fraction = self.settings.header_footer_fraction;
        let mut headers = Vec::new();
        let mut footers = Vec::new();

        for page in pages {
            let header = page.header_text(fraction);
            if !header.is_empty() {
                headers.push(header);
            }
            let footer = page.footer_text(fraction);
            if !footer.is_empty() {
                footers.push(footer);
            }
        }
        (headers, footers)
    }
}

/// Page count, encryption flag and Info dictionary fields
fn document_metadata(doc: &Document) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("page_count".to_string(), json!(doc.get_pages().len()));
    metadata.insert(
        "encrypted".to_string(),
        json!(doc.trailer.get(b"Encrypt").is_ok()),
    );

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| match obj.as_reference() {
            Ok(id) => doc.get_object(id).ok(),
            Err(_) => Some(obj),
        })
        .and_then(|obj| obj.as_dict().ok());

    for (key, name) in INFO_FIELDS {
        let value = info
            .and_then(|dict| dict.get(key).ok())
            .and_then(|obj| match obj {
                Object::String(bytes, _) => Some(layout::decode_pdf_string(bytes)),
                Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .unwrap_or_default();
        metadata.insert(name.to_string(), json!(value));
    }

    metadata
}
