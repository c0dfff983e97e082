//! Document classification endpoints

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::Document;

/// File-level facts echoed back with a classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyMetadata {
    pub mime_type: String,
    pub file_size: u64,
    pub file_hash: String,
    pub industry: Option<String>,
    /// RFC 3339
    pub processed_at: String,
}

/// Response for a classified file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    /// Content hash, doubles as the document identifier
    pub document_id: String,
    pub filename: String,
    pub document_type: String,
    pub confidence_score: f64,
    pub classification_method: Option<String>,
    pub metadata: ClassifyMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl ClassifyResponse {
    fn new(filename: String, document: &Document) -> Self {
        Self {
            document_id: document.file_hash().to_string(),
            filename,
            document_type: document.document_type().to_string(),
            confidence_score: document.confidence_score(),
            classification_method: document.classification_method().map(str::to_string),
            metadata: ClassifyMetadata {
                mime_type: document.mime_type().to_string(),
                file_size: document.file_size(),
                file_hash: document.file_hash().to_string(),
                industry: document.industry().map(str::to_string),
                processed_at: document.processed_at().to_rfc3339(),
            },
            extracted_text: document.extracted_text().map(str::to_string),
        }
    }
}

/// A file that could not be classified within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub filename: String,
    pub error: String,
}

/// Response for a batch of files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub results: Vec<ClassifyResponse>,
    pub errors: Vec<BatchError>,
    pub processing_time_ms: u64,
}

struct Upload {
    filename: String,
    data: Bytes,
}

/// Everything a classification form carries
#[derive(Default)]
struct ClassifyForm {
    files: Vec<Upload>,
    industry: Option<String>,
    return_text: bool,
}

async fn read_form(mut multipart: Multipart) -> Result<ClassifyForm> {
    let mut form = ClassifyForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::validation(format!("Failed to read field '{}': {}", name, e)))?;

        match (name.as_str(), filename) {
            ("industry", None) => {
                let value = String::from_utf8_lossy(&data).trim().to_string();
                form.industry = (!value.is_empty()).then_some(value);
            }
            ("return_text", None) => {
                let value = String::from_utf8_lossy(&data).trim().to_lowercase();
                form.return_text = matches!(value.as_str(), "true" | "1" | "yes");
            }
            (_, Some(filename)) => form.files.push(Upload { filename, data }),
            (other, None) => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(form)
}

/// POST /api/classify - classify a single uploaded file
pub async fn classify_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ClassifyResponse>> {
    let form = read_form(multipart).await?;
    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| Error::validation("No file part in the request"))?;

    let response = classify_upload(&state, upload, form.industry, form.return_text).await?;
    Ok(Json(response))
}

/// POST /api/classify/batch - classify several files with bounded parallelism
pub async fn classify_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchResponse>> {
    let start = Instant::now();
    let form = read_form(multipart).await?;

    let processing = &state.config().processing;
    state
        .validator()
        .validate_batch_size(form.files.len(), processing.max_batch_size)?;
    let parallel = processing.effective_parallel_files();

    tracing::info!(
        "Classifying batch of {} files ({} in parallel)",
        form.files.len(),
        parallel
    );

    let industry = form.industry;
    let return_text = form.return_text;
    let outcomes: Vec<(String, Result<ClassifyResponse>)> = stream::iter(form.files)
        .map(|upload| {
            let state = state.clone();
            let industry = industry.clone();
            async move {
                let filename = upload.filename.clone();
                let outcome = classify_upload(&state, upload, industry, return_text).await;
                (filename, outcome)
            }
        })
        .buffer_unordered(parallel)
        .collect()
        .await;

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for (filename, outcome) in outcomes {
        match outcome {
            Ok(response) => results.push(response),
            Err(e) => errors.push(BatchError {
                filename,
                error: e.to_string(),
            }),
        }
    }

    Ok(Json(BatchResponse {
        success: !results.is_empty(),
        results,
        errors,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Validate, spool to a temp file and classify on the blocking pool
async fn classify_upload(
    state: &AppState,
    upload: Upload,
    industry: Option<String>,
    return_text: bool,
) -> Result<ClassifyResponse> {
    let Upload { filename, data } = upload;
    state.validator().validate(&filename, &data)?;

    tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

    let suffix = Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let mut temp = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile()?;
    temp.write_all(&data)?;
    temp.flush()?;

    let classifier = state.classifier();
    let file_timeout = Duration::from_secs(state.config().processing.file_timeout_secs);
    let file_start = Instant::now();

    // The temp file moves into the task and is removed when it finishes
    let task = tokio::task::spawn_blocking(move || {
        classifier.classify(temp.path(), industry.as_deref(), return_text)
    });

    let document = match timeout(file_timeout, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(Error::internal(format!("Classification task failed: {}", e))),
        Err(_) => {
            tracing::error!(
                "TIMEOUT classifying '{}' after {:.1}s (limit: {}s, size: {} bytes)",
                filename,
                file_start.elapsed().as_secs_f64(),
                file_timeout.as_secs(),
                data.len()
            );
            return Err(Error::internal(format!(
                "Processing timeout after {}s",
                file_timeout.as_secs()
            )));
        }
    };

    tracing::info!(
        "Classified '{}' as {} ({:.2}) in {:.1}s",
        filename,
        document.document_type(),
        document.confidence_score(),
        file_start.elapsed().as_secs_f64()
    );

    Ok(ClassifyResponse::new(filename, &document))
}
