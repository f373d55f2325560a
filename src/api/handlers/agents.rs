use crate::AppState;
use crate::types::{AgentInfo, Result, RunConfig};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// List the constructible agents.
#[utoipa::path(
    get,
    path = "/v1/agents",
    responses(
        (status = 200, description = "Agent catalogue", body = [AgentInfo])
    ),
    tag = "agents"
)]
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    Json(state.selector.catalogue())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct KnowledgeDocument {
    pub title: String,
    pub source: String,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadKnowledgeRequest {
    pub documents: Vec<KnowledgeDocument>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadKnowledgeResponse {
    pub chunks_loaded: usize,
}

/// Ingest documents into the assist agent's knowledge base.
#[utoipa::path(
    post,
    path = "/v1/agents/assist/knowledge",
    request_body = LoadKnowledgeRequest,
    responses(
        (status = 200, description = "Documents ingested", body = LoadKnowledgeResponse),
        (status = 500, description = "Embedding or storage failure")
    ),
    tag = "agents"
)]
pub async fn load_knowledge(
    State(state): State<AppState>,
    Json(payload): Json<LoadKnowledgeRequest>,
) -> Result<Json<LoadKnowledgeResponse>> {
    let agent = state
        .selector
        .assist_agent(&RunConfig::with_model(state.selector.default_model()));

    let documents: Vec<(String, String, String)> = payload
        .documents
        .into_iter()
        .map(|d| (d.title, d.source, d.content))
        .collect();

    let chunks_loaded = agent.load_knowledge(&documents).await?;
    Ok(Json(LoadKnowledgeResponse { chunks_loaded }))
}
