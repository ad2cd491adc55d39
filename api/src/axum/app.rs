use axum::Router;
use refdesk::Store;
use std::env;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{axum::state, http::routes};

const REQUIRED_ENV_VARS: &[&str] = &["MONGODB_URI", "OPENAI_API_KEY"];

pub async fn create() -> Router {
    for var in REQUIRED_ENV_VARS {
        assert!(env::var(var).is_ok(), "${var} not set");
    }

    let store = Store::connect()
        .await
        .expect("Failed to connect to MongoDB");

    Router::new()
        .merge(routes::mount())
        .layer(
            CorsLayer::permissive()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_headers(AllowHeaders::mirror_request()),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state::create(store))
}
