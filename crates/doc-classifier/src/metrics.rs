//! Classification metrics sinks
//!
//! The classifier reports through [`MetricsSink`]; recording never fails a
//! classification call.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::{Error, Result};

const LABELS: &[&str] = &["industry", "document_type"];
const CONFIDENCE_BUCKETS: &[f64] = &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Receives classification outcomes
pub trait MetricsSink: Send + Sync + std::fmt::Debug {
    /// Count one processed document
    fn record_processed(&self, industry: &str, document_type: &str);

    /// Observe the confidence of one classification
    fn observe_confidence(&self, industry: &str, document_type: &str, score: f64);

    /// Count one failed classification
    fn record_error(&self);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_processed(&self, _industry: &str, _document_type: &str) {}
    fn observe_confidence(&self, _industry: &str, _document_type: &str, _score: f64) {}
    fn record_error(&self) {}
}

type LabelKey = (String, String);

fn key(industry: &str, document_type: &str) -> LabelKey {
    (industry.to_string(), document_type.to_string())
}

/// Lock-free in-process counters, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    processed: DashMap<LabelKey, u64>,
    confidences: DashMap<LabelKey, Vec<f64>>,
    errors: AtomicU64,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed_count(&self, industry: &str, document_type: &str) -> u64 {
        self.processed
            .get(&key(industry, document_type))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// Total processed documents across all labels
    pub fn total_processed(&self) -> u64 {
        self.processed.iter().map(|entry| *entry.value()).sum()
    }

    pub fn confidences(&self, industry: &str, document_type: &str) -> Vec<f64> {
        self.confidences
            .get(&key(industry, document_type))
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_processed(&self, industry: &str, document_type: &str) {
        *self.processed.entry(key(industry, document_type)).or_insert(0) += 1;
    }

    fn observe_confidence(&self, industry: &str, document_type: &str, score: f64) {
        self.confidences
            .entry(key(industry, document_type))
            .or_default()
            .push(score);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Prometheus-backed sink with its own registry
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    processed: IntCounterVec,
    confidence: HistogramVec,
    errors: IntCounter,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let processed = IntCounterVec::new(
            Opts::new("documents_processed_total", "Number of documents classified"),
            LABELS,
        )
        .map_err(metrics_error)?;
        let confidence = HistogramVec::new(
            HistogramOpts::new("classification_confidence", "Classification confidence scores")
                .buckets(CONFIDENCE_BUCKETS.to_vec()),
            LABELS,
        )
        .map_err(metrics_error)?;
        let errors = IntCounter::new("classification_errors_total", "Number of failed classifications")
            .map_err(metrics_error)?;

        registry.register(Box::new(processed.clone())).map_err(metrics_error)?;
        registry.register(Box::new(confidence.clone())).map_err(metrics_error)?;
        registry.register(Box::new(errors.clone())).map_err(metrics_error)?;

        Ok(Self {
            registry,
            processed,
            confidence,
            errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| Error::internal(format!("metrics not UTF-8: {}", e)))
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_processed(&self, industry: &str, document_type: &str) {
        self.processed
            .with_label_values(&[industry, document_type])
            .inc();
    }

    fn observe_confidence(&self, industry: &str, document_type: &str, score: f64) {
        self.confidence
            .with_label_values(&[industry, document_type])
            .observe(score);
    }

    fn record_error(&self) {
        self.errors.inc();
    }
}

fn metrics_error(e: prometheus::Error) -> Error {
    Error::internal(format!("metrics: {}", e))
}
