//! Error types for the classification pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for classification operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by content extractors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The source file could not be read
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file could be read but its format could not be parsed
    #[error("Failed to extract {format} content: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// OCR tooling failed or produced unusable output
    #[error("OCR failed: {0}")]
    Ocr(String),
}

impl ExtractionError {
    /// Create a read error for a path
    pub fn read(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create a parse error for a format
    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    /// Create an OCR error
    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr(message.into())
    }
}

/// Classification errors
#[derive(Debug, Error)]
pub enum Error {
    /// Catch-all surfaced to callers of the classifier
    #[error("{0}")]
    Classification(String),

    /// Content extraction failed
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// No extractor registered for the sniffed MIME type
    #[error("Unsupported format: no extractor registered for MIME type {0}")]
    UnsupportedFormat(String),

    /// Input failed size/type/corruption checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a classification error
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Collapse any error into the uniform `Classification` variant
    pub fn into_classification(self) -> Self {
        match self {
            Error::Classification(msg) => {
                Error::Classification(format!("Error classifying document: {}", msg))
            }
            other => Error::Classification(format!("Error classifying document: {}", other)),
        }
    }

    /// True when the failure is attributable to the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Classification(_)
                | Error::Validation(_)
                | Error::UnsupportedFormat(_)
                | Error::Extraction(_)
                | Error::Json(_)
        )
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, message) = match &self {
            Error::Classification(msg) => ("classification_error", msg.clone()),
            Error::Validation(msg) => ("validation_error", msg.clone()),
            Error::UnsupportedFormat(mime) => {
                ("unsupported_type", format!("Unsupported file type: {}", mime))
            }
            Error::Extraction(err) => ("extraction_error", err.to_string()),
            Error::Json(err) => ("json_error", err.to_string()),
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                ("internal_error", "Internal server error".to_string())
            }
        };
        if !self.is_client_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_classification_wraps_every_variant() {
        let err = Error::UnsupportedFormat("image/gif".to_string()).into_classification();
        match err {
            Error::Classification(msg) => {
                assert!(msg.starts_with("Error classifying document:"));
                assert!(msg.contains("image/gif"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }

        let err = Error::classification("File not found: /tmp/x").into_classification();
        assert_eq!(
            err.to_string(),
            "Error classifying document: File not found: /tmp/x"
        );
    }

    #[test]
    fn test_client_error_mapping() {
        assert!(Error::validation("too big").is_client_error());
        assert!(!Error::internal("boom").is_client_error());
        let response = Error::classification("bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = Error::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let extraction = Error::from(ExtractionError::ocr("tesseract missing"));
        assert!(extraction.is_client_error());
        assert_eq!(extraction.into_response().status(), StatusCode::BAD_REQUEST);
        let config = Error::Config("bad port".to_string());
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
