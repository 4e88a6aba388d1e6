//! Page word routes
//!
//! Endpoints:
//! - GET /words/:file_id/:page - Words of one page (1-based)
//! - GET /words/:file_id - Title, author and page count

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::epub;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the words router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/words/:file_id", get(get_book_info))
        .route("/words/:file_id/:page", get(get_page_words))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageWordsResponse {
    pub words: Vec<String>,
    pub page: i64,
    pub total_pages: usize,
    /// Set when the page was cut to the configured word cap
    pub truncated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookInfoResponse {
    pub file_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub total_pages: usize,
}

/// GET /words/:file_id/:page
async fn get_page_words(
    State(state): State<AppState>,
    Path((file_id, page)): Path<(String, i64)>,
) -> Result<Json<PageWordsResponse>> {
    let path = state.uploads().resolve(&file_id).await?;
    let max_section_bytes = state.config().paging.max_section_bytes;

    let (words, total_pages) = run_blocking(move || {
        let archive = epub::load_with_limit(&path, max_section_bytes)?;
        let words = epub::page_words(&archive, page)?;
        Ok((words, epub::page_count(&archive)))
    })
    .await?;

    let (words, truncated) = cap_words(words, state.config().paging.max_words_per_page);

    tracing::debug!(
        file_id = %file_id,
        page,
        words = words.len(),
        truncated,
        "Served page"
    );

    Ok(Json(PageWordsResponse {
        words,
        page,
        total_pages,
        truncated,
    }))
}

/// GET /words/:file_id
async fn get_book_info(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<BookInfoResponse>> {
    let path = state.uploads().resolve(&file_id).await?;
    let max_section_bytes = state.config().paging.max_section_bytes;
    let archive =
        run_blocking(move || Ok(epub::load_with_limit(&path, max_section_bytes)?)).await?;

    Ok(Json(BookInfoResponse {
        file_id,
        total_pages: epub::page_count(&archive),
        title: archive.metadata.title,
        author: archive.metadata.author,
        language: archive.metadata.language,
    }))
}

/// Run archive parsing off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
}

fn cap_words(mut words: Vec<String>, max_words: Option<usize>) -> (Vec<String>, bool) {
    match max_words {
        Some(max) if words.len() > max => {
            words.truncate(max);
            (words, true)
        }
        _ => (words, false),
    }
}
