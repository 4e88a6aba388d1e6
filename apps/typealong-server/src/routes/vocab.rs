//! Random practice word routes

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

const DEFAULT_COUNT: usize = 10;

/// Create the vocabulary router
pub fn router() -> Router<AppState> {
    Router::new().route("/random-words", get(random_words))
}

#[derive(Debug, Deserialize)]
pub struct RandomWordsQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomWordsResponse {
    pub words: Vec<String>,
}

/// GET /random-words?count=N
///
/// `count` is clamped to `1..=max_random_words`.
async fn random_words(
    State(state): State<AppState>,
    Query(query): Query<RandomWordsQuery>,
) -> Json<RandomWordsResponse> {
    let max = state.config().vocabulary.max_random_words.max(1);
    let count = query.count.unwrap_or(DEFAULT_COUNT).clamp(1, max);

    Json(RandomWordsResponse {
        words: state.words().sample(count),
    })
}
