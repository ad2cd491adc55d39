use anyhow::Context;
use axum::extract::State;
use axum_jsonschema::Json;
use schemars::JsonSchema;

use crate::axum::{
    errors::{ApiError, ApiResult},
    state::AppState,
};
use ::refdesk::{search_text, search_vectors, SearchResult};

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 20;

#[derive(Debug, serde::Deserialize, JsonSchema)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: usize,
}

pub async fn text(
    State(state): State<AppState>,
    Json(SearchRequest { query, limit }): Json<SearchRequest>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let query = validate(&query)?;

    let results = search_text(&state.store, query, clamp_limit(limit))
        .await
        .context("Failed to search documents.")?;

    Ok(Json(results))
}

pub async fn vectors(
    State(state): State<AppState>,
    Json(SearchRequest { query, limit }): Json<SearchRequest>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let query = validate(&query)?;

    let results = search_vectors(&state.store, &state.openai, query, clamp_limit(limit))
        .await
        .context("Failed to search documents.")?;

    Ok(Json(results))
}

pub fn validate(query: &str) -> Result<&str, ApiError> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ApiError::EmptyQuery);
    }

    Ok(query)
}

pub const fn clamp_limit(limit: usize) -> usize {
    match limit {
        0 => DEFAULT_LIMIT,
        limit if limit > MAX_LIMIT => MAX_LIMIT,
        limit => limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(0), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(3), 3);
        assert_eq!(clamp_limit(500), MAX_LIMIT);
    }

    #[test]
    fn blank_queries_are_rejected() {
        assert!(matches!(validate("   "), Err(ApiError::EmptyQuery)));
        assert!(matches!(validate(" indexes "), Ok("indexes")));
    }
}
