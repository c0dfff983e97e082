//! Classification server binary
//!
//! Run with: cargo run -p doc-classifier --bin doc-classifier-server

use doc_classifier::{config::ClassifierConfig, server::ClassifierServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_classifier=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // DOC_CLASSIFIER_CONFIG names a TOML file; defaults otherwise
    let config = ClassifierConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Max file size: {} bytes", config.limits.max_file_size);
    tracing::info!("  - OCR: {} ({})", config.ocr.tesseract_cmd, config.ocr.language);
    tracing::info!("  - PDF renderer: {} at {} dpi", config.ocr.pdftoppm_cmd, config.ocr.render_dpi);
    tracing::info!(
        "  - Batch: up to {} files, {} in parallel",
        config.processing.max_batch_size,
        config.processing.effective_parallel_files()
    );

    let server = ClassifierServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  Metrics: http://{}/metrics", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/classify        - Classify one document");
    println!("  POST /api/classify/batch  - Classify several documents");
    println!("  GET  /api/industries      - Supported industries and document types");
    println!("  GET  /api/formats         - Accepted formats and limits");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
