//! Core types for the classification pipeline

pub mod classification;
pub mod content;
pub mod document;

pub use classification::{ClassificationMethod, ClassificationResult, UNKNOWN_DOCUMENT_TYPE};
pub use content::{ExtractedContent, Metadata, Table};
pub use document::Document;
