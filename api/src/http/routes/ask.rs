use axum::{routing::post, Router};

use crate::{axum::state::AppState, http::controllers::AskController};

pub fn mount() -> Router<AppState> {
    Router::new().nest(
        "/ask",
        Router::new()
            .route("/", post(AskController::show))
            .route("/stream", post(AskController::stream)),
    )
}
