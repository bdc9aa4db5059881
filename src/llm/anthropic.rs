// ABOUTME: Anthropic Messages API provider for persona-conditioned chat completions
// ABOUTME: Sends the system prompt separately and maps API failures onto upstream error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Anthropic Provider
//!
//! Speaks the Messages API (`POST {base_url}/messages`). The system prompt is
//! a top-level field rather than a message, so any `System` messages in the
//! request are merged into it. A single attempt is made per call; retries and
//! the overall deadline belong to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use super::{
    upstream_status_error, upstream_transport_error, ChatMessage, ChatRequest, ChatResponse,
    LlmProvider, MessageRole, TokenUsage,
};
use crate::config::LlmConfig;
use crate::constants::{chat, llm, service_names};
use crate::errors::AppError;

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Base URL, without the `/messages` suffix
    pub base_url: String,
    /// Value of the `anthropic-version` header
    pub api_version: String,
    /// Model used when the request does not name one
    pub default_model: String,
    /// Per-attempt HTTP timeout
    pub request_timeout: Duration,
}

impl AnthropicConfig {
    /// Build from server configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `ANTHROPIC_API_KEY` is missing
    pub fn from_llm_config(config: &LlmConfig) -> Result<Self, AppError> {
        let api_key = config
            .anthropic_api_key
            .clone()
            .ok_or_else(|| AppError::config("ANTHROPIC_API_KEY is required for the Anthropic provider"))?;

        Ok(Self {
            api_key,
            base_url: config.anthropic_base_url.clone(),
            api_version: config.anthropic_version.clone(),
            default_model: config
                .model
                .clone()
                .unwrap_or_else(|| llm::ANTHROPIC_DEFAULT_MODEL.to_owned()),
            request_timeout: Duration::from_secs(llm::HTTP_REQUEST_TIMEOUT_SECS),
        })
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: AnthropicConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(llm::HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "Initializing Anthropic provider: base_url={}, model={}",
            config.base_url, config.default_model
        );

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Split out system content; the Messages API only accepts user/assistant turns
    fn build_payload<'a>(&'a self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        let mut system_parts: Vec<&str> = request.system.as_deref().into_iter().collect();
        let mut messages = Vec::with_capacity(request.messages.len());

        for message in &request.messages {
            match message.role {
                MessageRole::System => system_parts.push(&message.content),
                MessageRole::User | MessageRole::Assistant => messages.push(to_api_message(message)),
            }
        }

        MessagesRequest {
            model: request
                .model
                .as_deref()
                .unwrap_or(&self.config.default_model),
            max_tokens: request.max_tokens.unwrap_or(chat::DEFAULT_MAX_OUTPUT_TOKENS),
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
            messages,
            temperature: request.temperature,
        }
    }

    /// Parse error response from API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
            |_| body.to_owned(),
            |parsed| format!("{} - {}", parsed.error.error_type, parsed.error.message),
        );
        upstream_status_error(service_names::ANTHROPIC, status, &detail)
    }
}

fn to_api_message(message: &ChatMessage) -> ApiMessage<'_> {
    ApiMessage {
        role: match message.role {
            MessageRole::Assistant => "assistant",
            MessageRole::User | MessageRole::System => "user",
        },
        content: &message.content,
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn display_name(&self) -> &'static str {
        "Anthropic Claude"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(llm.provider = "anthropic", llm.messages = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let payload = self.build_payload(request);

        debug!(
            model = payload.model,
            max_tokens = payload.max_tokens,
            system_len = payload.system.as_ref().map_or(0, String::len),
            "Sending Anthropic messages request"
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("content-type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Anthropic: {e}");
                upstream_transport_error(service_names::ANTHROPIC, &e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| upstream_transport_error(service_names::ANTHROPIC, &e))?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Anthropic response: {e}");
            AppError::external_service(
                service_names::ANTHROPIC,
                format!("Failed to parse response: {e}"),
            )
        })?;

        let content = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(AppError::external_service(
                service_names::ANTHROPIC,
                "Response contained no text content",
            ));
        }

        Ok(ChatResponse {
            content,
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
            finish_reason: parsed.stop_reason,
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let request = ChatRequest::new(vec![ChatMessage::user("ping")]).with_max_tokens(1);
        match self.complete(&request).await {
            Ok(_) => Ok(true),
            Err(e) if e.code.is_transient() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig {
            api_key: "test-key".to_owned(),
            base_url: "https://api.anthropic.com/v1/".to_owned(),
            api_version: llm::ANTHROPIC_VERSION.to_owned(),
            default_model: llm::ANTHROPIC_DEFAULT_MODEL.to_owned(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_messages_url_trims_slash() {
        assert_eq!(
            provider().messages_url(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_payload_merges_system_messages() {
        let provider = provider();
        let request = ChatRequest::new(vec![
            ChatMessage::system("extra rule"),
            ChatMessage::user("안녕"),
            ChatMessage::assistant("안녕하세요"),
            ChatMessage::user("혈압 쟀어요"),
        ])
        .with_system("persona")
        .with_max_tokens(1000);

        let payload = provider.build_payload(&request);
        assert_eq!(payload.system.as_deref(), Some("persona\n\nextra rule"));
        assert_eq!(payload.messages.len(), 3);
        assert_eq!(payload.messages[0].role, "user");
        assert_eq!(payload.messages[1].role, "assistant");
        assert_eq!(payload.messages[2].content, "혈압 쟀어요");
        assert_eq!(payload.max_tokens, 1000);
        assert_eq!(payload.model, llm::ANTHROPIC_DEFAULT_MODEL);
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let status = reqwest::StatusCode::from_u16(529).unwrap();
        let error = AnthropicProvider::parse_error_response(status, body);
        assert!(error.code.is_transient());
        assert!(error.message.contains("overloaded_error"));
    }
}
