//! Document classification pipeline
//!
//! Ties the pieces together: hash and sniff the file, pick an extractor,
//! extract, derive enhancement features, run one or all industry strategies
//! and package the winner into a [`Document`].

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};

use crate::config::ClassifierConfig;
use crate::enhancement::EnhancementFeatures;
use crate::error::{Error, Result};
use crate::extractors::{mime, ExtractorRegistry};
use crate::files::hash_file;
use crate::metrics::{MetricsSink, NoopMetrics};
use crate::strategies::{Industry, IndustryStrategy, RuleContext, StrategyInfo};
use crate::types::{ClassificationMethod, ClassificationResult, Document, ExtractedContent};

/// Label used in metrics when no industry hint was given
const UNSPECIFIED_INDUSTRY: &str = "unknown";

/// Classifies files into industry document types
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    config: ClassifierConfig,
    registry: ExtractorRegistry,
    strategies: Vec<IndustryStrategy>,
    metrics: Arc<dyn MetricsSink>,
}

impl DocumentClassifier {
    /// Classifier with every extractor and strategy registered and no metrics
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_metrics(config, Arc::new(NoopMetrics))
    }

    /// Classifier reporting to the given metrics sink
    pub fn with_metrics(config: ClassifierConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        let registry = ExtractorRegistry::with_defaults(config.clone());

        let strategies: Vec<IndustryStrategy> = Industry::ALL
            .iter()
            .map(|&industry| IndustryStrategy::for_industry(industry))
            .collect();
        for strategy in &strategies {
            info!("Registered {} industry strategy", strategy.industry_name());
        }

        Self {
            config,
            registry,
            strategies,
            metrics,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Classify the file at `path`.
    ///
    /// With an industry hint only that strategy runs; otherwise every
    /// strategy runs and the most confident result wins. Any failure is
    /// reported as [`Error::Classification`].
    pub fn classify(
        &self,
        path: impl AsRef<Path>,
        industry: Option<&str>,
        return_extracted_text: bool,
    ) -> Result<Document> {
        let path = path.as_ref();
        let industry = industry.map(str::trim).filter(|hint| !hint.is_empty());
        self.classify_file(path, industry, return_extracted_text)
            .map_err(|e| {
                self.metrics.record_error();
                error!(path = %path.display(), "Classification error: {}", e);
                e.into_classification()
            })
    }

    fn classify_file(
        &self,
        path: &Path,
        industry: Option<&str>,
        return_extracted_text: bool,
    ) -> Result<Document> {
        if !path.exists() {
            return Err(Error::classification(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let industry = industry.map(str::parse::<Industry>).transpose()?;

        let file_size = std::fs::metadata(path)?.len();
        let file_hash = hash_file(path)?;
        let mime_type = mime::sniff_file(path)?;

        let extractor = self
            .registry
            .get_extractor_for_mime_type(mime_type)
            .ok_or_else(|| Error::UnsupportedFormat(mime_type.to_string()))?;
        let content = extractor.extract_content(path)?;

        let enhancement = EnhancementFeatures::from_content(&content);
        let result = self.classify_content(&content, industry);

        let label = industry.map_or(UNSPECIFIED_INDUSTRY, |i| i.as_str());
        self.metrics.record_processed(label, &result.document_type);
        self.metrics
            .observe_confidence(label, &result.document_type, result.confidence_score);

        let mut metadata = content.metadata.clone();
        metadata.extend(enhancement.to_metadata());
        metadata.insert("classification_method".to_string(), json!(result.method));

        let ExtractedContent {
            text,
            tables,
            headers,
            footers,
            ..
        } = content;

        let document = Document::builder(file_hash, mime_type, file_size)
            .classification(result.document_type, result.confidence_score)
            .industry(industry.map(|i| i.to_string()))
            .extracted_text(return_extracted_text.then_some(text))
            .metadata(metadata)
            .tables(tables)
            .headers(headers)
            .footers(footers)
            .build();

        info!(
            document_type = document.document_type(),
            confidence_score = document.confidence_score(),
            industry = document.industry().unwrap_or(UNSPECIFIED_INDUSTRY),
            file_size = document.file_size(),
            "Document classified successfully"
        );

        Ok(document)
    }

    /// Classify already-extracted content
    pub fn classify_content(
        &self,
        content: &ExtractedContent,
        industry: Option<Industry>,
    ) -> ClassificationResult {
        match industry {
            Some(industry) => {
                self.classify_with_strategy(IndustryStrategy::for_industry(industry), content)
            }
            None => self.classify_generic(content),
        }
    }

    /// Run one strategy, re-scoring from table text when the text gives nothing
    pub fn classify_with_strategy(
        &self,
        strategy: IndustryStrategy,
        content: &ExtractedContent,
    ) -> ClassificationResult {
        let result = strategy.classify(&content.text, &RuleContext::with_tables(content.tables()));
        if !result.is_unknown() || !content.has_tables() {
            return result;
        }

        let table_text = content
            .tables()
            .iter()
            .flatten()
            .map(|row| row.join(" "))
            .collect::<Vec<_>>()
            .join(" ");
        let table_result = strategy.keyword_match(&table_text);

        if !table_result.is_unknown() && table_result.confidence_score > result.confidence_score {
            ClassificationResult::matched(
                table_result.document_type,
                table_result.confidence_score,
                ClassificationMethod::TableAnalysis,
            )
        } else {
            result
        }
    }

    /// Run every strategy in registration order and keep the strictly best
    pub fn classify_generic(&self, content: &ExtractedContent) -> ClassificationResult {
        let mut best: Option<ClassificationResult> = None;

        for &strategy in &self.strategies {
            let result = self.classify_with_strategy(strategy, content);
            let best_score = best.as_ref().map_or(0.0, |b| b.confidence_score);
            if result.confidence_score > best_score {
                best = Some(result);
            }
        }

        best.unwrap_or_else(|| ClassificationResult::unknown(ClassificationMethod::None))
    }

    /// Catalog summary of every registered strategy
    pub fn strategies_info(&self) -> Vec<StrategyInfo> {
        self.strategies.iter().map(|s| s.strategy_info()).collect()
    }
}
