use axum::{routing::get, Json, Router};
use std::env;

mod ask;
mod search;

use crate::axum::state::AppState;

pub fn mount() -> Router<AppState> {
    Router::new()
        .merge(search::mount())
        .merge(ask::mount())
        .route("/version", get(version))
}

#[derive(serde::Serialize)]
struct RefdeskVersion {
    semver: String,
    rev: Option<String>,
    compile_time: String,
}

#[allow(clippy::unused_async)]
async fn version() -> Json<RefdeskVersion> {
    Json(RefdeskVersion {
        rev: env::var("GIT_REV").ok(),
        semver: env!("CARGO_PKG_VERSION").to_string(),
        compile_time: env!("STATIC_BUILD_DATE").to_string(),
    })
}
