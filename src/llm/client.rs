//! LLM client abstraction.
//!
//! All providers implement [`LlmClient`], allowing agents to be built
//! against the trait and tested with mock clients.

use crate::types::{Result, ToolCall, ToolDefinition};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion from a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with a system prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with conversation history as (role, content) pairs.
    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String>;

    /// Generate with tool calling support.
    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

/// Response from an LLM generation request.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The text content of the response.
    pub content: String,
    /// Any tool calls requested by the model.
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls").
    pub finish_reason: String,
}

/// Builds a client for a given model id.
///
/// The agent selector asks for a fresh client per run so each request can
/// carry its own model override. Tests substitute a factory that hands out
/// mock clients.
pub trait LlmClientFactory: Send + Sync {
    fn client_for(&self, model_id: &str) -> std::sync::Arc<dyn LlmClient>;
}
