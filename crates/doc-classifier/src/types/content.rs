//! Normalized extraction output shared by every extractor

use serde::{Deserialize, Serialize};

/// Open-ended extractor metadata
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A table as ordered rows of cell strings
pub type Table = Vec<Vec<String>>;

/// Content extracted from a single file.
///
/// Built through the `with_*` methods, which keep the invariant that
/// `tables`, `headers` and `footers` are either absent or non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Cleaned full-document text (empty when nothing was extracted)
    pub text: String,
    /// Extractor-specific facts (page count, OCR confidence, ...)
    pub metadata: Metadata,
    /// Detected tables
    pub tables: Option<Vec<Table>>,
    /// Header snippets, one per detected region
    pub headers: Option<Vec<String>>,
    /// Footer snippets, one per detected region
    pub footers: Option<Vec<String>>,
    /// Raw source bytes (image extractor only)
    #[serde(skip)]
    pub images: Option<Vec<Vec<u8>>>,
    /// Best-effort language code
    pub language: Option<String>,
    /// Extraction quality in [0, 1]
    pub confidence: f64,
}

impl ExtractedContent {
    /// Start a record from already-cleaned text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach tables, dropping empty tables
    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        let tables: Vec<Table> = tables.into_iter().filter(|t| !t.is_empty()).collect();
        self.tables = non_empty(tables);
        self
    }

    /// Attach header snippets, dropping blank ones
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = non_empty(drop_blank(headers));
        self
    }

    /// Attach footer snippets, dropping blank ones
    pub fn with_footers(mut self, footers: Vec<String>) -> Self {
        self.footers = non_empty(drop_blank(footers));
        self
    }

    /// Attach raw image payloads
    pub fn with_images(mut self, images: Vec<Vec<u8>>) -> Self {
        self.images = non_empty(images);
        self
    }

    /// Attach a detected language
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Attach the extraction confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Tables as a slice (empty when absent)
    pub fn tables(&self) -> &[Table] {
        self.tables.as_deref().unwrap_or(&[])
    }

    /// True when at least one table was detected
    pub fn has_tables(&self) -> bool {
        self.tables.is_some()
    }
}

fn drop_blank(items: Vec<String>) -> Vec<String> {
    items.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
