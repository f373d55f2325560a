use crate::AppState;
use crate::agents::orchestrator::{CreateWorkflowRequest, WorkflowDefinition, WorkflowRun};
use crate::types::{AgentInfo, AgentType, Result};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Register a workflow definition.
#[utoipa::path(
    post,
    path = "/v1/orchestration/workflows",
    request_body = CreateWorkflowRequest,
    responses(
        (status = 200, description = "Workflow created", body = WorkflowDefinition),
        (status = 400, description = "Invalid workflow definition")
    ),
    tag = "orchestration"
)]
pub async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<Json<WorkflowDefinition>> {
    Ok(Json(state.workflows.create_workflow(payload)?))
}

#[utoipa::path(
    get,
    path = "/v1/orchestration/workflows",
    responses(
        (status = 200, description = "All workflow definitions", body = [WorkflowDefinition])
    ),
    tag = "orchestration"
)]
pub async fn list_workflows(State(state): State<AppState>) -> Json<Vec<WorkflowDefinition>> {
    Json(state.workflows.list_workflows())
}

#[utoipa::path(
    get,
    path = "/v1/orchestration/workflows/{workflow_id}",
    params(("workflow_id" = String, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Workflow definition", body = WorkflowDefinition),
        (status = 404, description = "Unknown workflow")
    ),
    tag = "orchestration"
)]
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowDefinition>> {
    Ok(Json(state.workflows.get_workflow(&workflow_id)?))
}

#[utoipa::path(
    delete,
    path = "/v1/orchestration/workflows/{workflow_id}",
    params(("workflow_id" = String, Path, description = "Workflow id")),
    responses(
        (status = 200, description = "Workflow deleted"),
        (status = 404, description = "Unknown workflow")
    ),
    tag = "orchestration"
)]
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.workflows.delete_workflow(&workflow_id)?;
    Ok(Json(serde_json::json!({ "deleted": workflow_id })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteWorkflowRequest {
    pub message: String,
}

/// Start a workflow run in the background.
#[utoipa::path(
    post,
    path = "/v1/orchestration/workflows/{workflow_id}/execute",
    params(("workflow_id" = String, Path, description = "Workflow id")),
    request_body = ExecuteWorkflowRequest,
    responses(
        (status = 200, description = "Run started", body = WorkflowRun),
        (status = 404, description = "Unknown workflow")
    ),
    tag = "orchestration"
)]
pub async fn execute_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    Json(payload): Json<ExecuteWorkflowRequest>,
) -> Result<Json<WorkflowRun>> {
    Ok(Json(state.workflows.execute(&workflow_id, payload.message)?))
}

/// Poll a workflow run for status and results.
#[utoipa::path(
    get,
    path = "/v1/orchestration/runs/{run_id}",
    params(("run_id" = String, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run state", body = WorkflowRun),
        (status = 404, description = "Unknown run")
    ),
    tag = "orchestration"
)]
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<WorkflowRun>> {
    Ok(Json(state.workflows.get_run(&run_id)?))
}

/// Agents available as workflow steps.
#[utoipa::path(
    get,
    path = "/v1/orchestration/agents",
    responses(
        (status = 200, description = "Member agents", body = [AgentInfo])
    ),
    tag = "orchestration"
)]
pub async fn list_member_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    let members = state
        .selector
        .catalogue()
        .into_iter()
        .filter(|info| info.agent_type != AgentType::Orchestrator)
        .collect();
    Json(members)
}
