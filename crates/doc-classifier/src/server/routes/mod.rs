//! API routes for the classification server

pub mod classify;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Uploads get a larger body limit
        .route(
            "/classify",
            post(classify::classify_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/classify/batch",
            post(classify::classify_batch).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/industries", get(list_industries))
        .route("/formats", get(list_formats))
}

/// GET /api/industries - strategies and their document types
async fn list_industries(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "industries": state.classifier().strategies_info(),
    }))
}

/// GET /api/formats - accepted MIME types and upload limits
async fn list_formats(State(state): State<AppState>) -> Json<Value> {
    let limits = &state.config().limits;
    Json(json!({
        "mime_types": state.classifier().registry().supported_mime_types(),
        "allowed_extensions": limits.allowed_extensions,
        "max_file_size": limits.max_file_size,
        "max_batch_size": state.config().processing.max_batch_size,
    }))
}
