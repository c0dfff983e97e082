//! doc-classifier: business document classification
//!
//! Extracts text, tables and page furniture from PDFs, scanned images, Word
//! and Excel files, then scores the content against industry rule sets
//! (financial, healthcare) to name the document type. Ships a thin axum
//! server and Prometheus metrics so the pipeline runs as a service.

pub mod classifier;
pub mod config;
pub mod enhancement;
pub mod error;
pub mod extractors;
pub mod files;
pub mod metrics;
pub mod server;
pub mod strategies;
pub mod types;

pub use classifier::DocumentClassifier;
pub use config::ClassifierConfig;
pub use enhancement::EnhancementFeatures;
pub use error::{Error, ExtractionError, Result};
pub use extractors::{Extractor, ExtractorKind, ExtractorRegistry};
pub use metrics::{InMemoryMetrics, MetricsSink, NoopMetrics, PrometheusMetrics};
pub use strategies::{Industry, IndustryStrategy};
pub use types::{
    ClassificationMethod, ClassificationResult, Document, ExtractedContent, Metadata, Table,
};
