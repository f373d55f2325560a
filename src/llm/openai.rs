use crate::llm::client::{LlmClient, LlmResponse};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FinishReason, FunctionObject, ToolChoiceOptions,
    },
};
use async_trait::async_trait;

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
        }
    }

    fn history_to_messages(messages: &[(String, String)]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(content.clone()),
                ),
                _ => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    content.clone(),
                )),
            })
            .collect()
    }

    fn to_openai_tools(tools: &[ToolDefinition]) -> Vec<ChatCompletionTools> {
        tools
            .iter()
            .map(|tool| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObject {
                        name: tool.name.clone(),
                        description: Some(tool.description.clone()),
                        parameters: Some(tool.parameters.clone()),
                        strict: None,
                    },
                })
            })
            .collect()
    }

    fn convert_tool_calls(calls: &[ChatCompletionMessageToolCalls]) -> Vec<ToolCall> {
        calls
            .iter()
            .filter_map(|call| match call {
                ChatCompletionMessageToolCalls::Function(call) => Some(ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: serde_json::from_str(&call.function.arguments)
                        .unwrap_or(serde_json::Value::Null),
                }),
                // Custom tool calls are never requested here.
                ChatCompletionMessageToolCalls::Custom(_) => None,
            })
            .collect()
    }

    fn first_content(response: &CreateChatCompletionResponse) -> Result<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::Llm("No response from OpenAI".to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage::from(prompt.to_string()),
            )])
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Llm(format!("OpenAI API error: {}", e)))?;

        Self::first_content(&response)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                    system.to_string(),
                )),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    prompt.to_string(),
                )),
            ])
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Llm(format!("OpenAI API error: {}", e)))?;

        Self::first_content(&response)
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::history_to_messages(messages))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Llm(format!("OpenAI API error: {}", e)))?;

        Self::first_content(&response)
    }

    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let openai_tools = Self::to_openai_tools(tools);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                    system.to_string(),
                )),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    prompt.to_string(),
                )),
            ])
            .tools(openai_tools)
            .tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Llm(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AppError::Llm("No response from OpenAI".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .as_deref()
            .map(Self::convert_tool_calls)
            .unwrap_or_default();

        let finish_reason = match &choice.finish_reason {
            Some(FinishReason::ToolCalls) => "tool_calls",
            Some(FinishReason::Length) => "length",
            Some(FinishReason::ContentFilter) => "content_filter",
            Some(FinishReason::FunctionCall) => "function_call",
            _ => "stop",
        }
        .to_string();

        Ok(LlmResponse {
            content: choice.message.content.clone().unwrap_or_default(),
            tool_calls,
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Builds [`OpenAiClient`]s sharing one set of credentials.
pub struct OpenAiClientFactory {
    api_key: String,
    api_base: String,
}

impl OpenAiClientFactory {
    pub fn new(api_key: String, api_base: String) -> Self {
        Self { api_key, api_base }
    }
}

impl crate::llm::client::LlmClientFactory for OpenAiClientFactory {
    fn client_for(&self, model_id: &str) -> std::sync::Arc<dyn LlmClient> {
        std::sync::Arc::new(OpenAiClient::new(
            self.api_key.clone(),
            self.api_base.clone(),
            model_id.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::chat::{
        ChatCompletionMessageCustomToolCall, ChatCompletionMessageToolCall, CustomTool,
        FunctionCall,
    };

    #[test]
    fn test_tool_definitions_serialize_as_function_tools() {
        let tools = OpenAiClient::to_openai_tools(&[ToolDefinition {
            name: "get_stock_quote".to_string(),
            description: "Fetch the latest quote for a ticker symbol".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {"symbol": {"type": "string"}},
                "required": ["symbol"]
            }),
        }]);

        let value = serde_json::to_value(&tools).unwrap();
        assert_eq!(value[0]["type"], "function");
        assert_eq!(value[0]["function"]["name"], "get_stock_quote");
        assert_eq!(value[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_convert_tool_calls_extracts_function_calls() {
        let calls = vec![
            ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
                id: "call_1".to_string(),
                function: FunctionCall {
                    name: "web_search".to_string(),
                    arguments: r#"{"query":"rust"}"#.to_string(),
                },
            }),
            ChatCompletionMessageToolCalls::Custom(ChatCompletionMessageCustomToolCall {
                id: "call_2".to_string(),
                custom_tool: CustomTool {
                    name: "other".to_string(),
                    input: "ignored".to_string(),
                },
            }),
        ];

        let converted = OpenAiClient::convert_tool_calls(&calls);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].id, "call_1");
        assert_eq!(converted[0].name, "web_search");
        assert_eq!(converted[0].arguments["query"], "rust");
    }

    #[test]
    fn test_convert_tool_calls_tolerates_invalid_json_arguments() {
        let calls = vec![ChatCompletionMessageToolCalls::Function(
            ChatCompletionMessageToolCall {
                id: "call_1".to_string(),
                function: FunctionCall {
                    name: "web_search".to_string(),
                    arguments: "not json".to_string(),
                },
            },
        )];

        let converted = OpenAiClient::convert_tool_calls(&calls);
        assert_eq!(converted[0].arguments, serde_json::Value::Null);
    }
}
