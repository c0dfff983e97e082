//! Strategy-level classification results

use serde::{Deserialize, Serialize};

/// Sentinel document type when nothing matched
pub const UNKNOWN_DOCUMENT_TYPE: &str = "unknown";

/// How a classification result was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// A hand-written industry rule fired
    CustomRules,
    /// Keyword vocabulary overlap
    KeywordMatching,
    /// Keyword overlap computed over flattened table text
    TableAnalysis,
    /// The strategy failed internally and degraded to unknown
    Error,
    /// No strategy produced a positive score
    None,
}

impl ClassificationMethod {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomRules => "custom_rules",
            Self::KeywordMatching => "keyword_matching",
            Self::TableAnalysis => "table_analysis",
            Self::Error => "error",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result produced by an industry strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Catalog document type or `"unknown"`
    pub document_type: String,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// Method that produced the result
    pub method: ClassificationMethod,
    /// Failure message when `method` is `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassificationResult {
    /// Result for a matched document type
    pub fn matched(
        document_type: impl Into<String>,
        confidence_score: f64,
        method: ClassificationMethod,
    ) -> Self {
        Self {
            document_type: document_type.into(),
            confidence_score: confidence_score.clamp(0.0, 1.0),
            method,
            error: None,
        }
    }

    /// Unknown result with zero confidence
    pub fn unknown(method: ClassificationMethod) -> Self {
        Self::matched(UNKNOWN_DOCUMENT_TYPE, 0.0, method)
    }

    /// Degraded result carrying a failure message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::unknown(ClassificationMethod::Error)
        }
    }

    /// True when the document type is the unknown sentinel
    pub fn is_unknown(&self) -> bool {
        self.document_type == UNKNOWN_DOCUMENT_TYPE
    }
}
