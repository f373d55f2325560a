//! Web search agent.

use crate::agents::{Agent, run_tool_loop};
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;
use crate::tools::search::{FetchPageTool, SearchTool};
use crate::types::{AgentType, Result, RunConfig};
use async_trait::async_trait;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "\
You are a web research assistant. Use the web_search tool to find current \
information and fetch_page to read a specific page when the search snippet \
is not enough. Always cite the source URL for every claim you make. If the \
search returns nothing useful, say so instead of guessing.";

pub struct WebAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl WebAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SearchTool::new()));
        tools.register(Arc::new(FetchPageTool::new()));

        Self { llm, tools }
    }
}

#[async_trait]
impl Agent for WebAgent {
    async fn run(&self, input: &str, _config: &RunConfig) -> Result<String> {
        run_tool_loop(&self.llm, &self.tools, &self.system_prompt(), input).await
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn agent_type(&self) -> AgentType {
        AgentType::WebAgent
    }

    fn name(&self) -> &'static str {
        "Web Agent"
    }

    fn description(&self) -> &'static str {
        "Searches the web and answers questions with cited sources"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedLlm {
        reply: String,
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }

        async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
            Ok(self.reply.clone())
        }

        async fn generate_with_tools(
            &self,
            _system: &str,
            _prompt: &str,
            _tools: &[crate::types::ToolDefinition],
        ) -> Result<crate::llm::LlmResponse> {
            Ok(crate::llm::LlmResponse {
                content: self.reply.clone(),
                tool_calls: vec![],
                finish_reason: "stop".to_string(),
            })
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_run_without_tool_calls_returns_content() {
        let agent = WebAgent::new(Arc::new(CannedLlm {
            reply: "The capital of France is Paris.".to_string(),
        }));

        let result = agent.run("capital of France?", &RunConfig::default()).await;
        assert_eq!(result.unwrap(), "The capital of France is Paris.");
    }

    #[test]
    fn test_registers_search_tools() {
        let agent = WebAgent::new(Arc::new(CannedLlm {
            reply: String::new(),
        }));
        assert!(agent.tools.has_tool("web_search"));
        assert!(agent.tools.has_tool("fetch_page"));
    }
}
