//! Shared application state for the classification server

use std::sync::Arc;
use std::time::Instant;

use crate::classifier::DocumentClassifier;
use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::files::FileValidator;
use crate::metrics::PrometheusMetrics;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClassifierConfig,
    /// Shared across blocking tasks
    classifier: Arc<DocumentClassifier>,
    metrics: Arc<PrometheusMetrics>,
    validator: FileValidator,
    started_at: Instant,
}

impl AppState {
    /// Build the classifier and its Prometheus sink
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        tracing::info!("Initializing classification service state...");

        let metrics = Arc::new(PrometheusMetrics::new()?);
        let classifier = Arc::new(DocumentClassifier::with_metrics(
            config.clone(),
            metrics.clone(),
        ));
        let validator = FileValidator::new(config.limits.clone());

        tracing::info!(
            "Classifier ready: {} MIME types, {} industries",
            classifier.registry().supported_mime_types().len(),
            classifier.strategies_info().len()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                classifier,
                metrics,
                validator,
                started_at: Instant::now(),
            }),
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.inner.config
    }

    pub fn classifier(&self) -> Arc<DocumentClassifier> {
        self.inner.classifier.clone()
    }

    pub fn metrics(&self) -> &PrometheusMetrics {
        &self.inner.metrics
    }

    pub fn validator(&self) -> &FileValidator {
        &self.inner.validator
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
