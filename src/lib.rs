//! Atlas - an agent API server.
//!
//! Exposes a small catalogue of pre-built agents (web search, finance,
//! knowledge assist, Telegram, orchestration) over a versioned HTTP API,
//! with PostgreSQL for session history and pgvector for the knowledge
//! base.

pub mod agents;
pub mod api;
pub mod config;
pub mod db;
pub mod llm;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use agents::{Agent, AgentSelector, WorkflowEngine};
pub use config::Settings;
pub use db::{Database, InMemoryVectorStore, PgVectorStore, VectorStore};
pub use llm::{LlmClient, LlmClientFactory, LlmResponse};
pub use tools::ToolRegistry;
pub use types::{AgentType, AppError, Result, RunConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide configuration, read once at startup
    pub settings: Arc<Settings>,
    /// Session and message persistence; absent in stateless deployments
    pub database: Option<Arc<Database>>,
    /// Agent construction
    pub selector: Arc<AgentSelector>,
    /// Workflow definitions and background runs
    pub workflows: Arc<WorkflowEngine>,
}

impl AppState {
    /// Assemble state from loaded settings and an optional database.
    pub fn new(
        settings: Settings,
        database: Option<Arc<Database>>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        let selector = Arc::new(AgentSelector::new(&settings, vector_store));
        let workflows = Arc::new(WorkflowEngine::new(selector.clone()));

        Self {
            settings: Arc::new(settings),
            database,
            selector,
            workflows,
        }
    }
}
