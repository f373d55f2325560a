//! LLM provider clients and abstractions.
//!
//! The rest of the application talks to models through the [`LlmClient`]
//! trait; [`OpenAiClient`] is the provider implementation. Embeddings for
//! the knowledge base go through [`EmbeddingClient`].

pub mod client;
pub mod embeddings;
pub mod openai;

pub use client::{LlmClient, LlmClientFactory, LlmResponse};
pub use embeddings::EmbeddingClient;
pub use openai::{OpenAiClient, OpenAiClientFactory};
