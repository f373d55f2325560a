use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Agent Types =============

/// Closed enumeration of the pre-built agents this server can construct.
///
/// Every variant maps to exactly one constructible agent. Unknown
/// identifiers are rejected by [`AgentType::from_str`] rather than
/// silently defaulting.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Web search and information retrieval.
    WebAgent,
    /// Framework assistance grounded on the knowledge base.
    Assist,
    /// Financial data and market analysis.
    FinanceAgent,
    /// Telegram bot operations with chat-id constraints.
    TelegramAgent,
    /// Multi-agent coordination and workflows.
    Orchestrator,
}

impl AgentType {
    /// All supported agent types, in catalogue order.
    pub fn all() -> &'static [AgentType] {
        &[
            AgentType::WebAgent,
            AgentType::Assist,
            AgentType::FinanceAgent,
            AgentType::TelegramAgent,
            AgentType::Orchestrator,
        ]
    }

    /// The wire identifier for this agent type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::WebAgent => "web_agent",
            AgentType::Assist => "assist",
            AgentType::FinanceAgent => "finance_agent",
            AgentType::TelegramAgent => "telegram_agent",
            AgentType::Orchestrator => "orchestrator",
        }
    }
}

impl std::str::FromStr for AgentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "web_agent" => Ok(AgentType::WebAgent),
            "assist" => Ok(AgentType::Assist),
            "finance_agent" => Ok(AgentType::FinanceAgent),
            "telegram_agent" => Ok(AgentType::TelegramAgent),
            "orchestrator" => Ok(AgentType::Orchestrator),
            other => Err(AppError::UnsupportedAgent(other.to_string())),
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request agent construction parameters.
///
/// Created by the route layer for each run and discarded after the
/// agent call returns.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Model identifier passed through to the LLM provider.
    pub model_id: String,
    /// Identifier of the requesting user, if any.
    pub user_id: Option<String>,
    /// Session the run belongs to; a fresh one is minted when absent.
    pub session_id: Option<String>,
    /// Verbose per-run logging.
    pub debug_mode: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_id: "gpt-4.1".to_string(),
            user_id: None,
            session_id: None,
            debug_mode: false,
        }
    }
}

impl RunConfig {
    /// Build a run config with the given model id.
    pub fn with_model(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Self::default()
        }
    }
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunResponse {
    pub response: String,
    pub agent: AgentType,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentInfo {
    pub agent_type: AgentType,
    pub name: String,
    pub description: String,
}

// ============= Conversation Types =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

// ============= Knowledge / Vector Types =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported agent type: {0}")]
    UnsupportedAgent(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::UnsupportedAgent(agent) => (
                axum::http::StatusCode::NOT_FOUND,
                format!("Unsupported agent type: {}", agent),
            ),
            AppError::Configuration(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Database(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Llm(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_agent_type_round_trip() {
        for agent_type in AgentType::all() {
            let parsed = AgentType::from_str(agent_type.as_str()).unwrap();
            assert_eq!(parsed, *agent_type);
        }
    }

    #[test]
    fn test_agent_type_rejects_unknown() {
        let err = AgentType::from_str("masumi_agent").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedAgent(_)));
        assert!(err.to_string().contains("masumi_agent"));
    }

    #[test]
    fn test_agent_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&AgentType::WebAgent).unwrap();
        assert_eq!(json, "\"web_agent\"");

        let parsed: AgentType = serde_json::from_str("\"finance_agent\"").unwrap();
        assert_eq!(parsed, AgentType::FinanceAgent);
    }

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.model_id, "gpt-4.1");
        assert!(config.user_id.is_none());
        assert!(config.session_id.is_none());
        assert!(!config.debug_mode);
    }
}
