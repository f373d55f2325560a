use crate::AppState;
use crate::agents::telegram::TelegramUpdate;
use crate::types::{Result, RunConfig};
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub processed: bool,
}

/// Telegram webhook entry point.
///
/// The bot API retries deliveries that do not return 200, so updates the
/// agent cannot act on (no message, no text) are still acknowledged.
#[utoipa::path(
    post,
    path = "/v1/telegram/webhook",
    responses(
        (status = 200, description = "Update processed", body = WebhookResponse),
        (status = 500, description = "Bot is not configured")
    ),
    tag = "telegram"
)]
pub async fn webhook(
    State(state): State<AppState>,
    Json(update): Json<TelegramUpdate>,
) -> Result<Json<WebhookResponse>> {
    let agent = state
        .selector
        .telegram_agent(&RunConfig::with_model(state.selector.default_model()))?;

    let reply = agent.handle_update(update).await?;
    Ok(Json(WebhookResponse {
        status: "ok",
        processed: reply.is_some(),
    }))
}

#[derive(Serialize, ToSchema)]
pub struct TelegramStatus {
    pub configured: bool,
}

/// Whether the Telegram bot integration is configured.
#[utoipa::path(
    get,
    path = "/v1/telegram/status",
    responses(
        (status = 200, description = "Integration status", body = TelegramStatus)
    ),
    tag = "telegram"
)]
pub async fn status(State(state): State<AppState>) -> Json<TelegramStatus> {
    Json(TelegramStatus {
        configured: state.selector.telegram_configured(),
    })
}
