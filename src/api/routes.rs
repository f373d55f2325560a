use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// All versioned routes, mounted under `/v1`.
pub fn create_router() -> Router<AppState> {
    let v1 = Router::new()
        .route("/health", get(crate::api::handlers::health::health))
        .route("/openapi.json", get(openapi))
        .route("/agents", get(crate::api::handlers::agents::list_agents))
        .route(
            "/agents/{agent_id}/runs",
            post(crate::api::handlers::runs::create_run),
        )
        .route(
            "/agents/assist/knowledge",
            post(crate::api::handlers::agents::load_knowledge),
        )
        .route(
            "/sessions/{session_id}/messages",
            get(crate::api::handlers::runs::get_session_messages),
        )
        .route(
            "/telegram/webhook",
            post(crate::api::handlers::telegram::webhook),
        )
        .route(
            "/telegram/status",
            get(crate::api::handlers::telegram::status),
        )
        .route(
            "/orchestration/workflows",
            get(crate::api::handlers::orchestration::list_workflows)
                .post(crate::api::handlers::orchestration::create_workflow),
        )
        .route(
            "/orchestration/workflows/{workflow_id}",
            get(crate::api::handlers::orchestration::get_workflow)
                .delete(crate::api::handlers::orchestration::delete_workflow),
        )
        .route(
            "/orchestration/workflows/{workflow_id}/execute",
            post(crate::api::handlers::orchestration::execute_workflow),
        )
        .route(
            "/orchestration/runs/{run_id}",
            get(crate::api::handlers::orchestration::get_run),
        )
        .route(
            "/orchestration/agents",
            get(crate::api::handlers::orchestration::list_member_agents),
        );

    Router::new().nest("/v1", v1)
}

async fn openapi() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::api::ApiDoc::openapi())
}

/// Fully assembled application with tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
