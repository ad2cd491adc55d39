#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod document;
pub mod openai;
mod prompt;
mod store;
pub mod stream;

pub use document::{Answer, Document, SearchResult};
pub use openai::OpenAI;
pub use prompt::build_prompt;
pub use store::Store;

use anyhow::Result;
use tracing::warn;

/// Searches the collection's keyword text index.
///
/// # Errors
///
/// This function will return an error if the database query fails.
pub async fn search_text(store: &Store, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
    store.text_search(query, limit).await
}

/// Embeds the query and searches the collection by vector similarity.
///
/// # Errors
///
/// This function will return an error if the `OpenAI` or database APIs fail.
pub async fn search_vectors(
    store: &Store,
    openai: &OpenAI,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    let embedding = openai.embed(query).await?;

    store.vector_search(&embedding, limit).await
}

/// Answers a question grounded in the most relevant documents.
///
/// Falls back to a canned answer when the query can't be embedded.
///
/// # Errors
///
/// This function will return an error if retrieval or completion fails.
pub async fn answer(store: &Store, openai: &OpenAI, query: &str, limit: usize) -> Result<Answer> {
    let embedding = match openai.embed(query).await {
        Ok(embedding) => embedding,
        Err(error) => {
            warn!("Failed to embed query: {error}");

            return Ok(Answer {
                answer: stream::FALLBACK_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }
    };

    let sources = store.vector_search(&embedding, limit).await?;
    let answer = openai.prompt(&build_prompt(query, &sources)).await?;

    Ok(Answer { answer, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::OpenAIConfig;

    // Client construction is lazy, so parsing the URI is all that happens here.
    async fn dormant_store() -> Store {
        std::env::set_var("MONGODB_URI", "mongodb://127.0.0.1:27017");

        Store::connect().await.unwrap()
    }

    fn unreachable_openai() -> OpenAI {
        OpenAI::with_config(
            OpenAIConfig::new()
                .with_api_base("http://127.0.0.1:1/v1")
                .with_api_key("unused"),
        )
    }

    #[tokio::test]
    async fn answer_falls_back_when_embedding_fails() {
        let store = dormant_store().await;

        let response = answer(&store, &unreachable_openai(), "what is sharding?", 5)
            .await
            .unwrap();

        assert_eq!(response.answer, stream::FALLBACK_ANSWER);
        assert!(response.sources.is_empty());
    }
}
