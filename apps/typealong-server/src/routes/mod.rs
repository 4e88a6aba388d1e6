//! Route modules for TypeAlong Server

pub mod download;
pub mod health;
pub mod upload;
pub mod vocab;
pub mod words;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Build the application router
///
/// Every API route is served both at the root and under `/api`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(words::router())
        .merge(upload::router(state.config().storage.max_upload_bytes))
        .merge(vocab::router())
        .merge(download::router());

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api", api.clone().route("/status", get(health::health_check)))
        .merge(api)
        .with_state(state)
}
