//! Final classification record returned to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{Metadata, Table};
use crate::error::Result;

/// A classified document.
///
/// Fields are read-only; a `Document` is assembled once through
/// [`DocumentBuilder`] and `processed_at` is stamped at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    document_type: String,
    confidence_score: f64,
    mime_type: String,
    file_size: u64,
    /// SHA-256 of the file bytes, used as content-addressable identifier
    file_hash: String,
    industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extracted_text: Option<String>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tables: Option<Vec<Table>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    footers: Option<Vec<String>>,
    processed_at: DateTime<Utc>,
}

impl Document {
    /// Start assembling a document
    pub fn builder(
        file_hash: impl Into<String>,
        mime_type: impl Into<String>,
        file_size: u64,
    ) -> DocumentBuilder {
        DocumentBuilder {
            file_hash: file_hash.into(),
            mime_type: mime_type.into(),
            file_size,
            document_type: super::UNKNOWN_DOCUMENT_TYPE.to_string(),
            confidence_score: 0.0,
            industry: None,
            extracted_text: None,
            metadata: Metadata::new(),
            tables: None,
            headers: None,
            footers: None,
        }
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn file_hash(&self) -> &str {
        &self.file_hash
    }

    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn tables(&self) -> Option<&[Table]> {
        self.tables.as_deref()
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    pub fn footers(&self) -> Option<&[String]> {
        self.footers.as_deref()
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    /// Classification method recorded in the metadata
    pub fn classification_method(&self) -> Option<&str> {
        self.metadata
            .get("classification_method")
            .and_then(|v| v.as_str())
    }

    /// Serialize into the flat transport record
    pub fn to_record(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a document from its transport record
    pub fn from_record(record: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(record)?)
    }
}

/// Builder for [`Document`]
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    document_type: String,
    confidence_score: f64,
    mime_type: String,
    file_size: u64,
    file_hash: String,
    industry: Option<String>,
    extracted_text: Option<String>,
    metadata: Metadata,
    tables: Option<Vec<Table>>,
    headers: Option<Vec<String>>,
    footers: Option<Vec<String>>,
}

impl DocumentBuilder {
    /// Set the classification outcome
    pub fn classification(mut self, document_type: impl Into<String>, confidence_score: f64) -> Self {
        self.document_type = document_type.into();
        self.confidence_score = confidence_score.clamp(0.0, 1.0);
        self
    }

    pub fn industry(mut self, industry: Option<String>) -> Self {
        self.industry = industry;
        self
    }

    pub fn extracted_text(mut self, text: Option<String>) -> Self {
        self.extracted_text = text;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn tables(mut self, tables: Option<Vec<Table>>) -> Self {
        self.tables = tables;
        self
    }

    pub fn headers(mut self, headers: Option<Vec<String>>) -> Self {
        self.headers = headers;
        self
    }

    pub fn footers(mut self, footers: Option<Vec<String>>) -> Self {
        self.footers = footers;
        self
    }

    /// Finish the document, stamping `processed_at` with the current time
    pub fn build(self) -> Document {
        Document {
            document_type: self.document_type,
            confidence_score: self.confidence_score,
            mime_type: self.mime_type,
            file_size: self.file_size,
            file_hash: self.file_hash,
            industry: self.industry,
            extracted_text: self.extracted_text,
            metadata: self.metadata,
            tables: self.tables,
            headers: self.headers,
            footers: self.footers,
            processed_at: Utc::now(),
        }
    }
}
