//! Embedding client for the knowledge base.
//!
//! Wraps the OpenAI embeddings endpoint. The assist agent uses this when
//! loading documentation into the pgvector store.

use crate::types::{AppError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput},
};

/// Dimensionality of `text-embedding-3-small` vectors.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

pub struct EmbeddingClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl EmbeddingClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Embed a batch of texts, preserving input order.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(texts))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build embedding request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::Llm(format!("OpenAI embeddings error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed(vec![text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| AppError::Llm("Empty embedding response".to_string()))
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}
