//! Telegram bot agent.
//!
//! Used two ways: the `/v1` run endpoint drives it like any other agent,
//! and the webhook handler feeds it incoming bot updates and ships the
//! reply back to the originating chat.

use crate::agents::{Agent, run_tool_loop};
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;
use crate::tools::telegram::{AdminSendMessageTool, SendMessageTool, TelegramApi};
use crate::types::{AgentType, Result, RunConfig};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

const SYSTEM_PROMPT: &str = "\
You are a Telegram assistant bot. Keep replies short and suitable for chat. \
Use Telegram-flavoured Markdown sparingly. You may only message the chat a \
conversation came from; admin notifications go through admin_send_message \
and are restricted to the admin chat.";

/// Incoming webhook payload, reduced to the fields the bot acts on.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramChat {
    pub id: i64,
}

pub struct TelegramAgent {
    llm: Arc<dyn LlmClient>,
    api: TelegramApi,
    tools: ToolRegistry,
}

impl TelegramAgent {
    pub fn new(llm: Arc<dyn LlmClient>, api: TelegramApi, admin_chat_id: Option<String>) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SendMessageTool::new(api.clone())));
        if let Some(admin) = admin_chat_id {
            tools.register(Arc::new(AdminSendMessageTool::new(api.clone(), admin)));
        }

        Self { llm, api, tools }
    }

    /// Handle one webhook update end to end.
    ///
    /// Updates without a text message (stickers, edits, joins) are
    /// acknowledged and dropped. Returns the reply text that was sent,
    /// if any.
    pub async fn handle_update(&self, update: TelegramUpdate) -> Result<Option<String>> {
        let Some(message) = update.message else {
            tracing::debug!(update_id = update.update_id, "ignoring update without message");
            return Ok(None);
        };
        let Some(text) = message.text else {
            tracing::debug!(update_id = update.update_id, "ignoring non-text message");
            return Ok(None);
        };

        let reply = run_tool_loop(&self.llm, &self.tools, &self.system_prompt(), &text).await?;

        let chat_id = message.chat.id.to_string();
        self.api
            .send_message(&chat_id, &reply, Some(message.message_id))
            .await?;

        Ok(Some(reply))
    }
}

#[async_trait]
impl Agent for TelegramAgent {
    async fn run(&self, input: &str, _config: &RunConfig) -> Result<String> {
        run_tool_loop(&self.llm, &self.tools, &self.system_prompt(), input).await
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn agent_type(&self) -> AgentType {
        AgentType::TelegramAgent
    }

    fn name(&self) -> &'static str {
        "Telegram Agent"
    }

    fn description(&self) -> &'static str {
        "Handles Telegram bot conversations and admin notifications"
    }
}
