//! Pre-built agents and the selector that constructs them.
//!
//! Each agent wires a system prompt, an LLM client and a set of tools
//! together behind the [`Agent`] trait. The [`selector`] module maps an
//! [`AgentType`](crate::types::AgentType) to a fresh agent instance per
//! request.

pub mod assist;
pub mod finance;
pub mod orchestrator;
pub mod selector;
pub mod telegram;
pub mod web;

use crate::llm::LlmClient;
use crate::tools::ToolRegistry;
use crate::types::{Result, RunConfig};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub use orchestrator::WorkflowEngine;
pub use selector::AgentSelector;

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run the agent against a single user message.
    async fn run(&self, input: &str, config: &RunConfig) -> Result<String>;

    /// Get the agent's system prompt
    fn system_prompt(&self) -> String;

    /// Get the agent type
    fn agent_type(&self) -> crate::types::AgentType;

    /// Human-readable agent name for the catalogue.
    fn name(&self) -> &'static str;

    /// One-line description for the catalogue.
    fn description(&self) -> &'static str;
}

/// Upper bound on tool round-trips per run.
const MAX_TOOL_ITERATIONS: usize = 5;

/// Shared tool-calling loop.
///
/// Asks the model with the registry's tool definitions, executes any
/// requested calls, and feeds the results back until the model answers in
/// plain text or the iteration cap is hit. Tool failures are reported
/// back to the model as results rather than aborting the run.
pub(crate) async fn run_tool_loop(
    llm: &Arc<dyn LlmClient>,
    tools: &ToolRegistry,
    system: &str,
    input: &str,
) -> Result<String> {
    let definitions = tools.get_tool_definitions();
    if definitions.is_empty() {
        return llm.generate_with_system(system, input).await;
    }

    let mut prompt = input.to_string();
    for _ in 0..MAX_TOOL_ITERATIONS {
        let response = llm.generate_with_tools(system, &prompt, &definitions).await?;

        if response.tool_calls.is_empty() {
            return Ok(response.content);
        }

        let mut results = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            tracing::debug!(tool = %call.name, "executing tool call");
            let output = match tools.execute(&call.name, call.arguments.clone()).await {
                Ok(value) => value.to_string(),
                Err(e) => json!({ "error": e.to_string() }).to_string(),
            };
            results.push(format!("{}: {}", call.name, output));
        }

        prompt = format!(
            "{}\n\nTool results:\n{}\n\nAnswer the original question using the tool results above.",
            input,
            results.join("\n")
        );
    }

    // Iteration cap reached; force a plain-text answer.
    llm.generate_with_system(system, &prompt).await
}
