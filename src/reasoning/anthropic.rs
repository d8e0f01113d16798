//! Anthropic Messages API client
//!
//! Implements `ReasoningService` over the Messages endpoint with tool use.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::CddError;
use crate::models::{ToolContract, ToolRequest, Turn};
use crate::reasoning::{AssistantReply, ReasoningService};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 16000;

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            model,
            base_url: MESSAGES_URL.to_string(),
        }
    }
}

#[async_trait]
impl ReasoningService for AnthropicClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolContract],
    ) -> Result<AssistantReply> {
        if self.api_key.is_empty() {
            return Err(CddError::ConfigError(
                "ANTHROPIC_API_KEY not configured".to_string(),
            ));
        }

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            tools,
            messages: turns,
        };

        info!(model = %self.model, turns = turns.len(), "Calling Anthropic API");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic API request failed: {}", e);
                CddError::ReasoningError(format!("Anthropic API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Anthropic API error response: {}", error_text);
            return Err(CddError::ReasoningError(format!(
                "Anthropic API returned {}: {}",
                status, error_text
            )));
        }

        let message: MessagesResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Anthropic response: {}", e);
            CddError::ReasoningError(format!("Anthropic parse error: {}", e))
        })?;

        Ok(classify_response(message))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    tools: &'a [ToolContract],
    messages: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Map a Messages response onto the loop's three signals.
fn classify_response(message: MessagesResponse) -> AssistantReply {
    let text = collect_text(&message.content);

    match message.stop_reason.as_deref() {
        Some("end_turn") => AssistantReply::FinalAnswer { text },
        Some("tool_use") => {
            let requests = collect_tool_requests(&message.content);
            AssistantReply::ToolRequests {
                text: if text.is_empty() { None } else { Some(text) },
                content: Value::Array(message.content),
                requests,
            }
        }
        other => AssistantReply::Other {
            reason: other.unwrap_or("missing stop_reason").to_string(),
            text: if text.is_empty() { None } else { Some(text) },
        },
    }
}

fn collect_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tool-use blocks in the order the service emitted them.
fn collect_tool_requests(blocks: &[Value]) -> Vec<ToolRequest> {
    blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("tool_use"))
        .map(|b| ToolRequest {
            id: b
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: b
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            input: b.get("input").cloned().unwrap_or(Value::Null),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let turns = vec![Turn::user_text("Subject to review: Acme Holdings Ltd")];
        let tools = vec![ToolContract {
            name: "web_search".to_string(),
            description: "Search the internet".to_string(),
            input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        }];

        let request = MessagesRequest {
            model: "test-model",
            max_tokens: MAX_TOKENS,
            system: "system prompt",
            tools: &tools,
            messages: &turns,
        };

        let serialized = serde_json::to_string(&request).unwrap();
        assert!(serialized.contains("Acme Holdings Ltd"));
        assert!(serialized.contains("input_schema"));
        assert!(serialized.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_classify_end_turn() {
        let message = MessagesResponse {
            content: vec![json!({"type": "text", "text": "Report follows"})],
            stop_reason: Some("end_turn".to_string()),
        };

        match classify_response(message) {
            AssistantReply::FinalAnswer { text } => assert_eq!(text, "Report follows"),
            other => panic!("expected final answer, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_tool_use_preserves_order() {
        let message = MessagesResponse {
            content: vec![
                json!({"type": "text", "text": "Screening first."}),
                json!({"type": "tool_use", "id": "tu_1", "name": "dow_jones_screen",
                       "input": {"name": "Acme Holdings Ltd"}}),
                json!({"type": "tool_use", "id": "tu_2", "name": "web_search",
                       "input": {"query": "Acme Holdings BVI registry"}}),
            ],
            stop_reason: Some("tool_use".to_string()),
        };

        match classify_response(message) {
            AssistantReply::ToolRequests { text, requests, .. } => {
                assert_eq!(text.as_deref(), Some("Screening first."));
                assert_eq!(requests.len(), 2);
                assert_eq!(requests[0].name, "dow_jones_screen");
                assert_eq!(requests[1].id, "tu_2");
            }
            other => panic!("expected tool requests, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unknown_stop_reason() {
        let message = MessagesResponse {
            content: vec![],
            stop_reason: Some("max_tokens".to_string()),
        };

        match classify_response(message) {
            AssistantReply::Other { reason, text } => {
                assert_eq!(reason, "max_tokens");
                assert!(text.is_none());
            }
            other => panic!("expected other signal, got {:?}", other),
        }
    }
}
