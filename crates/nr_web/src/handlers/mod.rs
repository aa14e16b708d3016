use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::extract::UploadedFile;
use crate::AppState;

pub mod articles;
pub mod comments;

/// Path ids that are not integers can never match a row.
fn parse_id(raw: &str, resource: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::NotFound(format!("{} {} not found", resource, raw)))
}

/// Uploads are only written once the rest of the payload has passed
/// validation.
async fn store_upload(state: &AppState, upload: UploadedFile) -> Result<String, ApiError> {
    Ok(state.media.save_image(&upload.file_name, &upload.bytes).await?)
}

// GET /api/
pub async fn api_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "articles": state.config.absolute("/api/articles/").to_string(),
        "comments": state.config.absolute("/api/comments/").to_string(),
    }))
}

// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn handler_404() -> ApiError {
    ApiError::NotFound("nothing to see here".to_string())
}
