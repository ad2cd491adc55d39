use async_fn_stream::try_fn_stream;
use futures::{Stream, StreamExt};
use tracing::warn;

use crate::{build_prompt, document::SearchResult, OpenAI, Store};

/// Canned answer returned when the query can't be embedded, instead of
/// failing the whole request.
pub const FALLBACK_ANSWER: &str =
    "I'm having trouble understanding your question right now. Please try again in a moment.";

pub enum PartialResult {
    References(Vec<SearchResult>),
    PartialAnswer(String),
}

impl From<&Vec<SearchResult>> for PartialResult {
    fn from(results: &Vec<SearchResult>) -> Self {
        Self::References(results.clone())
    }
}

pub fn ask(
    store: Store,
    openai: OpenAI,
    query: String,
    limit: usize,
) -> impl Stream<Item = std::result::Result<PartialResult, anyhow::Error>> {
    try_fn_stream(|emitter| async move {
        let Ok(embedding) = openai.embed(&query).await.map_err(|error| {
            warn!("Failed to embed query: {error}");
        }) else {
            emitter
                .emit(PartialResult::PartialAnswer(FALLBACK_ANSWER.to_string()))
                .await;

            return Ok(());
        };

        let results = store.vector_search(&embedding, limit).await?;
        emitter.emit((&results).into()).await;

        let mut completion = openai.prompt_stream(&build_prompt(&query, &results)).await?;

        while let Some(chunk) = completion.next().await {
            let chunk = chunk?;

            // Role-only chunks carry no content and are skipped.
            let Some(content) = chunk.choices.first().and_then(|c| c.delta.content.as_ref()) else {
                continue;
            };

            emitter
                .emit(PartialResult::PartialAnswer(content.clone()))
                .await;
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::OpenAIConfig;

    #[tokio::test]
    async fn ask_emits_only_the_canned_answer_when_embedding_fails() {
        std::env::set_var("MONGODB_URI", "mongodb://127.0.0.1:27017");
        let store = Store::connect().await.unwrap();
        let openai = OpenAI::with_config(
            OpenAIConfig::new()
                .with_api_base("http://127.0.0.1:1/v1")
                .with_api_key("unused"),
        );

        let results = ask(store, openai, "what is sharding?".to_string(), 5)
            .collect::<Vec<_>>()
            .await;

        assert_eq!(results.len(), 1);
        let Ok(PartialResult::PartialAnswer(text)) = &results[0] else {
            panic!("expected a partial answer");
        };
        assert_eq!(text, FALLBACK_ANSWER);
    }

    #[test]
    fn references_convert_from_search_results() {
        let results = vec![SearchResult {
            title: "Sharding".to_string(),
            url: "/docs/sharding".to_string(),
            text: "Sharding distributes data across shards.".to_string(),
            score: 0.42,
        }];

        let PartialResult::References(references) = (&results).into() else {
            panic!("expected references");
        };

        assert_eq!(references.len(), 1);
        assert_eq!(references[0].url, "/docs/sharding");
    }
}
