//! Error types for the TypeAlong server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::epub::{LoadError, PageError};
use crate::proxy::ProxyError;
use crate::storage::StorageError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("EPUB error: {0}")]
    Load(#[from] LoadError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut available_pages = None;

        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Load(e) => match e {
                LoadError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    "File not found".to_string(),
                ),
                LoadError::Malformed(_) => {
                    tracing::warn!("Malformed EPUB: {}", e);
                    (
                        StatusCode::BAD_REQUEST,
                        "malformed_epub",
                        "File is not a readable EPUB".to_string(),
                    )
                }
            },
            AppError::Page(e) => match e {
                PageError::OutOfRange { available, .. } => {
                    available_pages = Some(*available);
                    (StatusCode::BAD_REQUEST, "page_out_of_range", e.to_string())
                }
            },
            AppError::Storage(e) => match e {
                StorageError::NotFound(id) | StorageError::InvalidId(id) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("File not found: {}", id),
                ),
                StorageError::Io(io) => {
                    tracing::error!("Storage error: {}", io);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_error",
                        "Storage error".to_string(),
                    )
                }
            },
            AppError::Proxy(e) => match e {
                ProxyError::InvalidUrl(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_url", e.to_string())
                }
                _ => {
                    tracing::warn!("Proxy error: {}", e);
                    (StatusCode::BAD_GATEWAY, "upstream_error", e.to_string())
                }
            },
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "IO error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            available_pages,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Load(LoadError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (AppError::Load(LoadError::Malformed("x".into())), StatusCode::BAD_REQUEST),
            (
                AppError::Page(PageError::OutOfRange { page: 9, available: 2 }),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Storage(StorageError::InvalidId("..".into())), StatusCode::NOT_FOUND),
            (AppError::Proxy(ProxyError::Status(500)), StatusCode::BAD_GATEWAY),
            (AppError::Proxy(ProxyError::InvalidUrl("x".into())), StatusCode::BAD_REQUEST),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
