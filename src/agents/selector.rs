//! Agent selection and construction.
//!
//! [`AgentSelector`] is the single place agent identifiers become agent
//! instances. Every call builds a fresh agent so per-request model
//! overrides never leak between runs; only the heavyweight resources
//! (vector store, credentials) are shared.

use crate::agents::Agent;
use crate::agents::assist::AssistAgent;
use crate::agents::finance::FinanceAgent;
use crate::agents::orchestrator::OrchestratorAgent;
use crate::agents::telegram::TelegramAgent;
use crate::agents::web::WebAgent;
use crate::config::{LlmSettings, Settings, TelegramSettings};
use crate::db::VectorStore;
use crate::llm::{EmbeddingClient, LlmClientFactory, OpenAiClientFactory};
use crate::tools::telegram::TelegramApi;
use crate::types::{AgentInfo, AgentType, AppError, Result, RunConfig};
use std::sync::Arc;

pub struct AgentSelector {
    llm_factory: Arc<dyn LlmClientFactory>,
    vector_store: Arc<dyn VectorStore>,
    llm_settings: LlmSettings,
    telegram: TelegramSettings,
}

impl AgentSelector {
    pub fn new(settings: &Settings, vector_store: Arc<dyn VectorStore>) -> Self {
        let factory = OpenAiClientFactory::new(
            settings.llm.openai_api_key.clone(),
            settings.llm.openai_api_base.clone(),
        );

        Self::with_llm_factory(Arc::new(factory), settings, vector_store)
    }

    /// Construct with an explicit client factory; tests inject mocks here.
    pub fn with_llm_factory(
        llm_factory: Arc<dyn LlmClientFactory>,
        settings: &Settings,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            llm_factory,
            vector_store,
            llm_settings: settings.llm.clone(),
            telegram: settings.telegram.clone(),
        }
    }

    /// Build the agent for `agent_type` with the given run parameters.
    ///
    /// Fails with [`AppError::Configuration`] when a variant's required
    /// settings are absent (the telegram agent without a bot token).
    pub fn select(&self, agent_type: AgentType, config: &RunConfig) -> Result<Box<dyn Agent>> {
        if config.debug_mode {
            tracing::debug!(agent = %agent_type, model = %config.model_id, "constructing agent");
        }

        let llm = || self.llm_factory.client_for(&config.model_id);
        match agent_type {
            AgentType::WebAgent => Ok(Box::new(WebAgent::new(llm()))),
            AgentType::FinanceAgent => Ok(Box::new(FinanceAgent::new(llm()))),
            AgentType::Assist => Ok(Box::new(self.assist_agent(config))),
            AgentType::TelegramAgent => Ok(Box::new(self.telegram_agent(config)?)),
            AgentType::Orchestrator => Ok(Box::new(OrchestratorAgent::new(llm()))),
        }
    }

    /// Concrete assist agent; the knowledge-loading endpoint calls
    /// `load_knowledge`, which is not part of the [`Agent`] surface.
    pub fn assist_agent(&self, config: &RunConfig) -> AssistAgent {
        let llm = self.llm_factory.client_for(&config.model_id);
        let embeddings = Arc::new(EmbeddingClient::new(
            self.llm_settings.openai_api_key.clone(),
            self.llm_settings.openai_api_base.clone(),
            self.llm_settings.embedding_model.clone(),
        ));
        AssistAgent::new(llm, embeddings, self.vector_store.clone())
    }

    /// Concrete telegram agent; the webhook handler needs more than the
    /// [`Agent`] surface.
    pub fn telegram_agent(&self, config: &RunConfig) -> Result<TelegramAgent> {
        let llm = self.llm_factory.client_for(&config.model_id);
        let api = self.telegram_api()?;
        Ok(TelegramAgent::new(
            llm,
            api,
            self.telegram.admin_chat_id.clone(),
        ))
    }

    /// Telegram API client, shared by the telegram agent and the webhook
    /// status endpoint.
    pub fn telegram_api(&self) -> Result<TelegramApi> {
        let token = self.telegram.bot_token.clone().ok_or_else(|| {
            AppError::Configuration(
                "TELEGRAM_BOT_TOKEN is required for the telegram agent".to_string(),
            )
        })?;
        Ok(TelegramApi::new(token))
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram.bot_token.is_some()
    }

    /// Catalogue of all constructible agents.
    pub fn catalogue(&self) -> Vec<AgentInfo> {
        AgentType::all()
            .iter()
            .map(|agent_type| {
                // Catalogue entries do not need live credentials.
                let config = RunConfig::with_model(&self.llm_settings.default_model);
                match self.select(*agent_type, &config) {
                    Ok(agent) => AgentInfo {
                        agent_type: *agent_type,
                        name: agent.name().to_string(),
                        description: agent.description().to_string(),
                    },
                    Err(_) => AgentInfo {
                        agent_type: *agent_type,
                        name: agent_type.as_str().to_string(),
                        description: "Unavailable: missing configuration".to_string(),
                    },
                }
            })
            .collect()
    }

    pub fn default_model(&self) -> &str {
        &self.llm_settings.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseSettings, ServerSettings};
    use crate::db::InMemoryVectorStore;
    use crate::llm::{LlmClient, LlmResponse};
    use async_trait::async_trait;

    struct StubLlm(String);

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn generate(&self, _prompt: &str) -> crate::types::Result<String> {
            Ok("stub".to_string())
        }
        async fn generate_with_system(
            &self,
            _system: &str,
            _prompt: &str,
        ) -> crate::types::Result<String> {
            Ok("stub".to_string())
        }
        async fn generate_with_history(
            &self,
            _messages: &[(String, String)],
        ) -> crate::types::Result<String> {
            Ok("stub".to_string())
        }
        async fn generate_with_tools(
            &self,
            _system: &str,
            _prompt: &str,
            _tools: &[crate::types::ToolDefinition],
        ) -> crate::types::Result<LlmResponse> {
            Ok(LlmResponse {
                content: "stub".to_string(),
                tool_calls: vec![],
                finish_reason: "stop".to_string(),
            })
        }
        fn model_name(&self) -> &str {
            &self.0
        }
    }

    struct StubFactory;

    impl LlmClientFactory for StubFactory {
        fn client_for(&self, model_id: &str) -> Arc<dyn LlmClient> {
            Arc::new(StubLlm(model_id.to_string()))
        }
    }

    fn test_settings(with_telegram: bool) -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseSettings {
                user: "ai".to_string(),
                password: "ai".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                database: "ai".to_string(),
            },
            llm: LlmSettings {
                openai_api_key: "sk-test".to_string(),
                openai_api_base: "https://api.openai.com/v1".to_string(),
                default_model: "gpt-4.1".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
            },
            telegram: TelegramSettings {
                bot_token: with_telegram.then(|| "123:abc".to_string()),
                admin_chat_id: None,
            },
        }
    }

    fn test_selector(with_telegram: bool) -> AgentSelector {
        AgentSelector::with_llm_factory(
            Arc::new(StubFactory),
            &test_settings(with_telegram),
            Arc::new(InMemoryVectorStore::new()),
        )
    }

    #[test]
    fn test_select_builds_every_agent_type() {
        let selector = test_selector(true);
        let config = RunConfig::default();

        for agent_type in AgentType::all() {
            let agent = selector.select(*agent_type, &config).unwrap();
            assert_eq!(agent.agent_type(), *agent_type);
        }
    }

    #[test]
    fn test_select_builds_independent_instances() {
        let selector = test_selector(true);
        let a = selector
            .select(AgentType::WebAgent, &RunConfig::with_model("gpt-4.1"))
            .unwrap();
        let b = selector
            .select(AgentType::WebAgent, &RunConfig::with_model("gpt-4o-mini"))
            .unwrap();

        // Separate constructions, not a shared singleton.
        assert!(!std::ptr::eq(
            a.as_ref() as *const dyn Agent as *const (),
            b.as_ref() as *const dyn Agent as *const ()
        ));
    }

    #[test]
    fn test_telegram_agent_requires_bot_token() {
        let selector = test_selector(false);
        let err = selector
            .select(AgentType::TelegramAgent, &RunConfig::default())
            .err()
            .expect("selection must fail without a bot token");
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_catalogue_lists_all_types() {
        let selector = test_selector(true);
        let catalogue = selector.catalogue();
        assert_eq!(catalogue.len(), AgentType::all().len());
        assert!(catalogue.iter().any(|a| a.agent_type == AgentType::Assist));
    }
}
