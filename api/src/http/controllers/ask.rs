use std::convert::Infallible;

use anyhow::Context;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use axum_jsonschema::Json;
use futures::Stream;
use tokio_stream::StreamExt;

use crate::{
    axum::{
        errors::{ApiError, ApiResult},
        state::AppState,
    },
    http::controllers::search::{clamp_limit, validate, SearchRequest},
};
use ::refdesk::{stream::PartialResult, Answer};

pub async fn show(
    State(state): State<AppState>,
    Json(SearchRequest { query, limit }): Json<SearchRequest>,
) -> ApiResult<Json<Answer>> {
    let query = validate(&query)?;

    let answer = refdesk::answer(&state.store, &state.openai, query, clamp_limit(limit))
        .await
        .context("Failed to answer query.")?;

    Ok(Json(answer))
}

#[derive(Debug, serde::Serialize)]
pub struct StreamError {
    pub error: &'static str,
}

#[allow(clippy::unused_async)]
pub async fn stream(
    State(state): State<AppState>,
    Json(SearchRequest { query, limit }): Json<SearchRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let query = validate(&query)?.to_string();

    let stream = refdesk::stream::ask(
        state.store.clone(),
        state.openai.clone(),
        query,
        clamp_limit(limit),
    );

    let stream = stream.map(|e| {
        let Ok(event) = e else {
            return Ok::<_, Infallible>(
                Event::default()
                    .id("error")
                    .json_data(StreamError {
                        error: "Failed to complete query.",
                    })
                    .unwrap(),
            );
        };

        match event {
            PartialResult::References(results) => Ok::<_, Infallible>(
                Event::default()
                    .id("references")
                    .json_data(results)
                    .unwrap(),
            ),
            PartialResult::PartialAnswer(answer) => {
                Ok::<_, Infallible>(Event::default().id("partial_answer").data(answer))
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
