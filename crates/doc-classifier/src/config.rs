//! Configuration for the classification service

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Environment variable naming a TOML configuration file
pub const CONFIG_ENV_VAR: &str = "DOC_CLASSIFIER_CONFIG";

/// Main classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifierConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Extraction tuning
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// External OCR tooling
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Upload limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl ClassifierConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Load from the file named by `DOC_CLASSIFIER_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes (default: 50MB, batches carry several files)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Thresholds used by the extractors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Alphanumeric ratio below which a PDF text layer is considered unusable
    #[serde(default = "default_ocr_threshold")]
    pub ocr_alnum_threshold: f64,
    /// Fraction of page height treated as header (top) and footer (bottom)
    #[serde(default = "default_margin_fraction")]
    pub header_footer_fraction: f64,
    /// Minimum absolute skew in degrees before an image is rotated
    #[serde(default = "default_deskew_threshold")]
    pub deskew_threshold_degrees: f32,
    /// Median filter radius used for denoising (1 = 3x3 window)
    #[serde(default = "default_median_radius")]
    pub median_radius: u32,
    /// Seconds to wait for the PDF text layer before falling back
    #[serde(default = "default_text_layer_timeout")]
    pub text_layer_timeout_secs: u64,
}

fn default_ocr_threshold() -> f64 { 0.1 }
fn default_margin_fraction() -> f64 { 0.1 }
fn default_deskew_threshold() -> f32 { 0.5 }
fn default_median_radius() -> u32 { 1 }
fn default_text_layer_timeout() -> u64 { 60 }

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_alnum_threshold: default_ocr_threshold(),
            header_footer_fraction: default_margin_fraction(),
            deskew_threshold_degrees: default_deskew_threshold(),
            median_radius: default_median_radius(),
            text_layer_timeout_secs: default_text_layer_timeout(),
        }
    }
}

/// OCR tool configuration (tesseract + poppler's pdftoppm)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable
    pub tesseract_cmd: String,
    /// pdftoppm executable used to render PDF pages
    pub pdftoppm_cmd: String,
    /// Tesseract language code
    pub language: String,
    /// Render resolution for PDF pages
    pub render_dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            pdftoppm_cmd: "pdftoppm".to_string(),
            language: "eng".to_string(),
            render_dpi: 150, // balance of quality and speed
        }
    }
}

/// Upload validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Accepted filename extensions (lowercase, no dot)
    pub allowed_extensions: Vec<String>,
    /// Accepted content MIME types
    pub allowed_mime_types: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: ["pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "doc", "docx", "xls", "xlsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_mime_types: [
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "image/jpeg",
                "image/png",
                "image/tiff",
                "image/bmp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Deadline for a single classification call in seconds (default: 300 = 5 minutes)
    pub file_timeout_secs: u64,
    /// Maximum number of files accepted in one batch request
    pub max_batch_size: usize,
    /// Number of files classified in parallel within a batch
    pub parallel_files: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            file_timeout_secs: 300,
            max_batch_size: 100,
            parallel_files: None, // Auto-detect from CPU count
        }
    }
}

impl ProcessingConfig {
    /// Effective batch parallelism
    pub fn effective_parallel_files(&self) -> usize {
        self.parallel_files
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}
