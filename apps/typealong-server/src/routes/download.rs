//! Download proxy route
//!
//! GET /download-epub?url=... relays a remote EPUB unchanged.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::proxy;
use crate::state::AppState;

/// Create the download router
pub fn router() -> Router<AppState> {
    Router::new().route("/download-epub", get(download_epub))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: String,
}

async fn download_epub(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let url = proxy::parse_url(&query.url)?;
    let download = proxy::fetch(
        state.http(),
        url,
        state.config().storage.max_upload_bytes,
    )
    .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CONTENT_LENGTH, download.data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", header_safe(&download.file_name)),
        )
        .body(Body::from(download.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Keep a file name usable inside a quoted header parameter
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
