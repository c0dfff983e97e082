//! Format-specific content extraction
//!
//! Each supported format has an extractor that turns a file on disk into
//! a normalized [`ExtractedContent`]. The set of formats is closed, so
//! extractors are variants of [`Extractor`] dispatched by `match`.

pub mod excel;
pub mod image;
pub mod layout;
pub mod mime;
pub mod ocr;
pub mod pdf;
pub mod registry;
pub mod text;
pub mod word;

use std::path::Path;

pub use excel::ExcelExtractor;
pub use image::ImageExtractor;
pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use word::WordExtractor;

use crate::config::ClassifierConfig;
use crate::error::ExtractionError;
use crate::types::ExtractedContent;

/// Extractor families the registry can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    Pdf,
    Image,
    Word,
    Excel,
}

impl ExtractorKind {
    /// Every kind, in default registration order
    pub const ALL: [ExtractorKind; 4] = [Self::Pdf, Self::Image, Self::Word, Self::Excel];

    /// MIME types this kind declares
    pub fn supported_mimes(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => PdfExtractor::MIME_TYPES,
            Self::Image => ImageExtractor::MIME_TYPES,
            Self::Word => WordExtractor::MIME_TYPES,
            Self::Excel => ExcelExtractor::MIME_TYPES,
        }
    }

    /// Display name of the extractor
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pdf => "PdfExtractor",
            Self::Image => "ImageExtractor",
            Self::Word => "WordExtractor",
            Self::Excel => "ExcelExtractor",
        }
    }

    /// Build a fresh extractor of this kind
    pub fn instantiate(&self, config: &ClassifierConfig) -> Extractor {
        match self {
            Self::Pdf => Extractor::Pdf(PdfExtractor::new(config)),
            Self::Image => Extractor::Image(ImageExtractor::new(config)),
            Self::Word => Extractor::Word(WordExtractor),
            Self::Excel => Extractor::Excel(ExcelExtractor),
        }
    }
}

/// A ready-to-use extractor instance
#[derive(Debug, Clone)]
pub enum Extractor {
    Pdf(PdfExtractor),
    Image(ImageExtractor),
    Word(WordExtractor),
    Excel(ExcelExtractor),
}

impl Extractor {
    pub fn kind(&self) -> ExtractorKind {
        match self {
            Self::Pdf(_) => ExtractorKind::Pdf,
            Self::Image(_) => ExtractorKind::Image,
            Self::Word(_) => ExtractorKind::Word,
            Self::Excel(_) => ExtractorKind::Excel,
        }
    }

    /// Extract normalized content from the file at `path`
    pub fn extract_content(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let result = match self {
            Self::Pdf(e) => e.extract_content(path),
            Self::Image(e) => e.extract_content(path),
            Self::Word(e) => e.extract_content(path),
            Self::Excel(e) => e.extract_content(path),
        };
        if let Err(ref e) = result {
            tracing::warn!(extractor = self.kind().name(), "Extraction failed: {}", e);
        }
        result
    }

    /// Structural sanity check; never fails, only answers
    pub fn validate_file(&self, path: &Path) -> bool {
        match self {
            Self::Pdf(e) => e.validate_file(path),
            Self::Image(e) => e.validate_file(path),
            Self::Word(e) => e.validate_file(path),
            Self::Excel(e) => e.validate_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_declare_distinct_mimes() {
        let mut seen = std::collections::HashSet::new();
        for kind in ExtractorKind::ALL {
            assert!(!kind.supported_mimes().is_empty());
            for mime in kind.supported_mimes() {
                assert!(seen.insert(*mime), "{} declared twice", mime);
            }
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn test_instantiate_matches_kind() {
        let config = ClassifierConfig::default();
        for kind in ExtractorKind::ALL {
            assert_eq!(kind.instantiate(&config).kind(), kind);
        }
    }

    #[test]
    fn test_validate_missing_file_is_false() {
        let config = ClassifierConfig::default();
        let missing = Path::new("/nonexistent/file.bin");
        for kind in ExtractorKind::ALL {
            assert!(!kind.instantiate(&config).validate_file(missing));
        }
    }
}
