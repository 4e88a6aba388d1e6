//! Upload Routes
//!
//! Endpoints:
//! - POST /upload - Store an EPUB sent as multipart form data
//! - DELETE /files/:file_id - Remove a stored EPUB

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the upload router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/files/:file_id", delete(delete_file))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
}

/// POST /upload
///
/// Stores the first file field of the form (a field with a filename, or one
/// named `file`).
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let max_bytes = state.config().storage.max_upload_bytes;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        if data.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload of {} bytes exceeds the {} byte limit",
                data.len(),
                max_bytes
            )));
        }

        let stored = state.uploads().save(&data).await?;

        tracing::info!(
            file_id = %stored.id,
            file_name = ?file_name,
            size = stored.size,
            "Upload complete"
        );

        return Ok(Json(UploadResponse {
            file_id: stored.id.to_string(),
        }));
    }

    Err(AppError::BadRequest(
        "Multipart body has no file field".to_string(),
    ))
}

/// DELETE /files/:file_id
async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode> {
    state.uploads().delete(&file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}
