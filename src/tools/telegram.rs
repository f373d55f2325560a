//! Telegram Bot API tools with chat-id constraint logic.
//!
//! Two send paths exist on purpose:
//! - `send_message` replies only to the chat an update came from
//! - `admin_send_message` targets the configured admin chat exclusively
//!
//! The constraint prevents an agent from messaging arbitrary chats.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Shared Telegram Bot API client used by the tools below.
#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramApi {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, DEFAULT_API_BASE.to_string())
    }

    /// Override the API base, used by tests to point at a mock server.
    pub fn with_api_base(bot_token: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            bot_token,
        }
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<Value> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(reply_id) = reply_to_message_id {
            body["reply_to_message_id"] = json!(reply_id);
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Telegram request failed: {}", e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid Telegram response: {}", e)))?;

        if !status.is_success() || payload.get("ok") != Some(&json!(true)) {
            let description = payload
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("unknown error");
            return Err(AppError::Internal(format!(
                "Telegram sendMessage failed: {}",
                description
            )));
        }

        Ok(payload)
    }
}

/// Reply tool constrained to the originating chat.
pub struct SendMessageTool {
    api: TelegramApi,
}

impl SendMessageTool {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "send_message"
    }

    fn description(&self) -> &str {
        "Send a reply message to the Telegram chat the current update came from"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "chat_id": {
                    "type": "string",
                    "description": "The chat ID to send the message to"
                },
                "text": {
                    "type": "string",
                    "description": "The message text to send"
                },
                "reply_to_message_id": {
                    "type": "integer",
                    "description": "Optional message ID to reply to"
                }
            },
            "required": ["chat_id", "text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let chat_id = args
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'chat_id' parameter".to_string()))?;
        let text = args
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'text' parameter".to_string()))?;
        let reply_to = args.get("reply_to_message_id").and_then(|v| v.as_i64());

        let payload = self.api.send_message(chat_id, text, reply_to).await?;
        let message_id = payload.pointer("/result/message_id").cloned();

        Ok(json!({
            "sent": true,
            "chat_id": chat_id,
            "message_id": message_id,
        }))
    }
}

/// Admin-initiated messaging, restricted to the configured admin chat.
pub struct AdminSendMessageTool {
    api: TelegramApi,
    admin_chat_id: String,
}

impl AdminSendMessageTool {
    pub fn new(api: TelegramApi, admin_chat_id: String) -> Self {
        Self { api, admin_chat_id }
    }
}

#[async_trait]
impl Tool for AdminSendMessageTool {
    fn name(&self) -> &str {
        "admin_send_message"
    }

    fn description(&self) -> &str {
        "Send an admin-initiated message; only the configured admin chat is allowed"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "chat_id": {
                    "type": "string",
                    "description": "The chat ID to send to (must be the admin chat)"
                },
                "text": {
                    "type": "string",
                    "description": "The message text to send"
                }
            },
            "required": ["chat_id", "text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let chat_id = args
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'chat_id' parameter".to_string()))?;
        let text = args
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'text' parameter".to_string()))?;

        if chat_id != self.admin_chat_id {
            return Err(AppError::InvalidInput(format!(
                "Admin messages may only target the admin chat, not '{}'",
                chat_id
            )));
        }

        let payload = self.api.send_message(chat_id, text, None).await?;
        let message_id = payload.pointer("/result/message_id").cloned();

        Ok(json!({
            "sent": true,
            "chat_id": chat_id,
            "message_id": message_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_api() -> TelegramApi {
        TelegramApi::new("123:abc".to_string())
    }

    #[test]
    fn test_send_tool_definition() {
        let tool = SendMessageTool::new(test_api());
        assert_eq!(tool.name(), "send_message");
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"][0], "chat_id");
        assert_eq!(schema["required"][1], "text");
    }

    #[tokio::test]
    async fn test_send_missing_text() {
        let tool = SendMessageTool::new(test_api());
        let result = tool.execute(json!({"chat_id": "42"})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_admin_send_rejects_non_admin_chat() {
        let tool = AdminSendMessageTool::new(test_api(), "100".to_string());
        let result = tool
            .execute(json!({"chat_id": "200", "text": "hello"}))
            .await;
        match result {
            Err(AppError::InvalidInput(msg)) => assert!(msg.contains("admin chat")),
            other => panic!("Expected InvalidInput, got {:?}", other.map(|_| ())),
        }
    }
}
