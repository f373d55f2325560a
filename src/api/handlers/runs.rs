use crate::AppState;
use crate::types::{
    AgentType, AppError, ChatMessage, MessageRole, Result, RunConfig, RunRequest, RunResponse,
};
use axum::{
    Json,
    extract::{Path, State},
};
use std::str::FromStr;
use uuid::Uuid;

/// Run an agent against a single message.
///
/// Unknown agent identifiers are a 404; this is the selector's fail-fast
/// contract surfacing at the HTTP layer. Conversation history is persisted
/// when a database is attached.
#[utoipa::path(
    post,
    path = "/v1/agents/{agent_id}/runs",
    params(
        ("agent_id" = String, Path, description = "Agent identifier, e.g. web_agent")
    ),
    request_body = RunRequest,
    responses(
        (status = 200, description = "Agent response", body = RunResponse),
        (status = 404, description = "Unknown agent identifier"),
        (status = 500, description = "Agent execution failed")
    ),
    tag = "agents"
)]
pub async fn create_run(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>> {
    let agent_type = AgentType::from_str(&agent_id)?;

    let session_id = payload
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let config = RunConfig {
        model_id: payload
            .model
            .clone()
            .unwrap_or_else(|| state.selector.default_model().to_string()),
        user_id: payload.user_id.clone(),
        session_id: Some(session_id.clone()),
        debug_mode: payload.debug,
    };

    tracing::info!(agent = %agent_type, session = %session_id, "agent run requested");

    let agent = state.selector.select(agent_type, &config)?;
    let response = agent.run(&payload.message, &config).await?;

    if let Some(db) = &state.database {
        db.create_session(&session_id, config.user_id.as_deref(), agent_type.as_str())
            .await?;
        db.add_message(
            &Uuid::new_v4().to_string(),
            &session_id,
            MessageRole::User,
            &payload.message,
        )
        .await?;
        db.add_message(
            &Uuid::new_v4().to_string(),
            &session_id,
            MessageRole::Assistant,
            &response,
        )
        .await?;
    }

    Ok(Json(RunResponse {
        response,
        agent: agent_type,
        session_id,
    }))
}

/// Conversation history for a session, oldest first.
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}/messages",
    params(
        ("session_id" = String, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Session messages"),
        (status = 404, description = "Unknown session"),
        (status = 500, description = "No database attached")
    ),
    tag = "agents"
)]
pub async fn get_session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>> {
    let db = state.database.as_ref().ok_or_else(|| {
        AppError::Configuration("Session history requires a database".to_string())
    })?;

    if !db.session_exists(&session_id).await? {
        return Err(AppError::NotFound(format!(
            "Session not found: {}",
            session_id
        )));
    }

    Ok(Json(db.get_session_history(&session_id).await?))
}
