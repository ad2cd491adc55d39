use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestUserMessageArgs, ChatCompletionResponseStream,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
    },
    Client,
};
use backoff::ExponentialBackoffBuilder;
use futures::future;

const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const CHAT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct OpenAI {
    client: Arc<Client<OpenAIConfig>>,
}

impl OpenAI {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(OpenAIConfig::new())
    }

    /// Builds a client against a specific configuration, for pointing at a
    /// compatible API or a different base URL.
    #[must_use]
    pub fn with_config(config: OpenAIConfig) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::from_secs(60)))
            .build();

        Self {
            client: Arc::new(Client::with_config(config).with_backoff(backoff)),
        }
    }

    /// Embeds a string into a query vector.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Embeddings API fails.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(EMBEDDING_MODEL)
            .input(text)
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        Ok(response
            .data
            .first()
            .ok_or_else(|| anyhow::anyhow!("Could not find embedding"))?
            .embedding
            .clone())
    }

    /// Embeds a batch of strings concurrently, preserving order.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Embeddings API fails for
    /// any of the inputs.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut responses = Vec::new();

        for text in texts {
            let client = self.client.clone();
            let request = CreateEmbeddingRequestArgs::default()
                .model(EMBEDDING_MODEL)
                .input(text)
                .build()?;

            responses.push(tokio::spawn(async move {
                client.embeddings().create(request).await
            }));
        }

        let responses = future::join_all(responses).await;

        let mut embeddings = Vec::new();

        for response in responses {
            let response = response??;

            embeddings.push(
                response
                    .data
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("Could not find embedding"))?
                    .embedding
                    .clone(),
            );
        }

        Ok(embeddings)
    }

    /// Prompts the chat model and returns the full completion.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Chat Completions API fails.
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        let response = self.client.chat().create(request(prompt)?).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("Could not find completion"))
    }

    /// Prompts the chat model and returns the token stream.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Chat Completions API fails.
    pub async fn prompt_stream(&self, prompt: &str) -> Result<ChatCompletionResponseStream> {
        Ok(self.client.chat().create_stream(request(prompt)?).await?)
    }
}

impl Default for OpenAI {
    fn default() -> Self {
        Self::new()
    }
}

fn request(prompt: &str) -> Result<CreateChatCompletionRequest> {
    Ok(CreateChatCompletionRequestArgs::default()
        .model(CHAT_MODEL)
        .temperature(0.3)
        .max_tokens(700_u16)
        .messages([ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into()])
        .build()?)
}
