//! HTTP API surface.
//!
//! All routes live under the `/v1` prefix; see [`routes::create_router`].
//! The OpenAPI document is served at `/v1/openapi.json`.

pub mod handlers;
pub mod routes;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::agents::list_agents,
        handlers::agents::load_knowledge,
        handlers::runs::create_run,
        handlers::runs::get_session_messages,
        handlers::telegram::webhook,
        handlers::telegram::status,
        handlers::orchestration::create_workflow,
        handlers::orchestration::list_workflows,
        handlers::orchestration::get_workflow,
        handlers::orchestration::delete_workflow,
        handlers::orchestration::execute_workflow,
        handlers::orchestration::get_run,
        handlers::orchestration::list_member_agents,
    ),
    components(schemas(
        crate::types::AgentType,
        crate::types::AgentInfo,
        crate::types::RunRequest,
        crate::types::RunResponse,
        crate::agents::orchestrator::WorkflowMode,
        crate::agents::orchestrator::WorkflowStep,
        crate::agents::orchestrator::WorkflowDefinition,
        crate::agents::orchestrator::CreateWorkflowRequest,
        crate::agents::orchestrator::RunStatus,
        crate::agents::orchestrator::StepResult,
        crate::agents::orchestrator::WorkflowRun,
        crate::agents::telegram::TelegramUpdate,
        crate::agents::telegram::TelegramMessage,
        crate::agents::telegram::TelegramChat,
        handlers::health::HealthResponse,
        handlers::agents::KnowledgeDocument,
        handlers::agents::LoadKnowledgeRequest,
        handlers::agents::LoadKnowledgeResponse,
        handlers::telegram::WebhookResponse,
        handlers::telegram::TelegramStatus,
        handlers::orchestration::ExecuteWorkflowRequest,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "agents", description = "Agent catalogue and runs"),
        (name = "telegram", description = "Telegram bot integration"),
        (name = "orchestration", description = "Multi-agent workflows")
    ),
    info(
        title = "Atlas Agent API",
        description = "Pre-built AI agents behind a versioned HTTP API"
    )
)]
pub struct ApiDoc;
