use axum::{routing::post, Router};

use crate::{axum::state::AppState, http::controllers::SearchController};

pub fn mount() -> Router<AppState> {
    Router::new()
        .route("/search", post(SearchController::text))
        .route("/vector-search", post(SearchController::vectors))
}
