//! File hashing and upload validation

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::extractors::mime;

const HASH_CHUNK_SIZE: usize = 4096;

/// SHA-256 of the file's bytes as lowercase hex, streamed in 4 KiB chunks
pub fn hash_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Checks an upload before it reaches the classifier
#[derive(Debug, Clone)]
pub struct FileValidator {
    limits: LimitsConfig,
}

impl FileValidator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate name, size and sniffed content type; returns the MIME type
    pub fn validate(&self, filename: &str, data: &[u8]) -> Result<&'static str> {
        if filename.trim().is_empty() {
            return Err(Error::validation("No selected file"));
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.limits.allowed_extensions.iter().any(|a| *a == extension) {
            return Err(Error::validation(format!(
                "File type not allowed. Allowed types: {}",
                self.limits.allowed_extensions.join(", ")
            )));
        }

        let size = data.len() as u64;
        if size > self.limits.max_file_size {
            return Err(Error::validation(format!(
                "File too large. Maximum size: {}MB",
                self.limits.max_file_size / (1024 * 1024)
            )));
        }

        let mime_type = mime::sniff_bytes(data);
        if !self.limits.allowed_mime_types.iter().any(|m| m == mime_type) {
            return Err(Error::validation(format!("Invalid file type: {}", mime_type)));
        }

        Ok(mime_type)
    }

    /// Reject empty or oversized batches
    pub fn validate_batch_size(&self, count: usize, max_batch_size: usize) -> Result<()> {
        if count == 0 {
            return Err(Error::validation("No files submitted"));
        }
        if count > max_batch_size {
            return Err(Error::validation(format!(
                "Batch size exceeds maximum of {} files",
                max_batch_size
            )));
        }
        Ok(())
    }
}
