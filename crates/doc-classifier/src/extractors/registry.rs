//! MIME type to extractor mapping

use std::collections::BTreeMap;
use std::path::Path;

use super::{mime, Extractor, ExtractorKind};
use crate::config::ClassifierConfig;
use crate::error::{Error, ExtractionError, Result};

/// Maps sniffed MIME types to extractor kinds.
///
/// Registering a kind records every MIME type it declares; a later
/// registration for the same MIME type silently replaces the earlier one.
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    config: ClassifierConfig,
    extractors: BTreeMap<String, ExtractorKind>,
}

impl ExtractorRegistry {
    /// Empty registry; extractors are built with `config`
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            extractors: BTreeMap::new(),
        }
    }

    /// Registry with PDF, image, Word and Excel extractors
    pub fn with_defaults(config: ClassifierConfig) -> Self {
        let mut registry = Self::new(config);
        for kind in ExtractorKind::ALL {
            registry.register(kind);
        }
        registry
    }

    /// Register a kind for every MIME type it declares
    pub fn register(&mut self, kind: ExtractorKind) {
        for mime_type in kind.supported_mimes() {
            self.register_mime(mime_type, kind);
        }
    }

    /// Register a kind for a single MIME type
    pub fn register_mime(&mut self, mime_type: &str, kind: ExtractorKind) {
        self.extractors.insert(mime_type.to_string(), kind);
        tracing::info!("Registered extractor {} for MIME type {}", kind.name(), mime_type);
    }

    /// Sniff the file's content and return a fresh extractor for it
    pub fn get_extractor(&self, path: &Path) -> Result<Extractor> {
        let mime_type = mime::sniff_file(path).map_err(|e| ExtractionError::read(path, e))?;
        self.get_extractor_for_mime_type(mime_type)
            .ok_or_else(|| Error::UnsupportedFormat(mime_type.to_string()))
    }

    /// All registered MIME types and the extractor that handles each
    pub fn supported_mime_types(&self) -> BTreeMap<String, &'static str> {
        self.extractors
            .iter()
            .map(|(mime_type, kind)| (mime_type.clone(), kind.name()))
            .collect()
    }

    /// True when an extractor is registered for `mime_type`
    pub fn validate_mime_type(&self, mime_type: &str) -> bool {
        self.extractors.contains_key(mime_type)
    }

    /// Fresh extractor for `mime_type`, if one is registered
    pub fn get_extractor_for_mime_type(&self, mime_type: &str) -> Option<Extractor> {
        self.extractors
            .get(mime_type)
            .map(|kind| kind.instantiate(&self.config))
    }
}
