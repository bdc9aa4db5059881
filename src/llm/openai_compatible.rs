// ABOUTME: Generic OpenAI-compatible LLM provider for local and cloud endpoints
// ABOUTME: Supports Ollama, vLLM, LocalAI, and any OpenAI-compatible chat completions API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! Generic implementation for any `OpenAI`-compatible LLM endpoint. Useful for
//! running the companion persona against a local model during development.
//!
//! ## Supported Backends
//!
//! - **Ollama**: <http://localhost:11434/v1>
//! - **vLLM**: <http://localhost:8000/v1>
//! - **`LocalAI`**: <http://localhost:8080/v1>

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use super::{
    upstream_status_error, upstream_transport_error, ChatMessage, ChatRequest, ChatResponse,
    LlmProvider, TokenUsage,
};
use crate::config::LlmConfig;
use crate::constants::{llm, service_names};
use crate::errors::AppError;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <http://localhost:11434/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
}

impl OpenAiCompatibleConfig {
    /// Build from server configuration
    #[must_use]
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            base_url: config.openai_compat_base_url.clone(),
            api_key: config.openai_compat_api_key.clone(),
            default_model: config
                .model
                .clone()
                .unwrap_or_else(|| llm::OPENAI_COMPAT_DEFAULT_MODEL.to_owned()),
        }
    }

    /// Detect the backend from the port for display purposes
    fn backend(&self) -> (&'static str, &'static str) {
        if self.base_url.contains(":11434") {
            ("ollama", "Ollama (Local)")
        } else if self.base_url.contains(":8000") {
            ("vllm", "vLLM (Local)")
        } else if self.base_url.contains(":8080") {
            ("localai", "LocalAI")
        } else {
            ("openai-compatible", "OpenAI-compatible")
        }
    }
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: llm::OPENAI_COMPAT_BASE_URL.to_owned(),
            api_key: None,
            default_model: llm::OPENAI_COMPAT_DEFAULT_MODEL.to_owned(),
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(llm::HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(llm::HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "Initializing {} provider: base_url={}, model={}",
            config.backend().1,
            config.base_url,
            config.default_model
        );

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// System prompt goes first as a `system` role message
    fn convert_messages(request: &ChatRequest) -> Vec<OpenAiMessage> {
        request
            .system
            .iter()
            .map(|system| OpenAiMessage {
                role: "system".to_owned(),
                content: system.clone(),
            })
            .chain(request.messages.iter().map(OpenAiMessage::from))
            .collect()
    }

    /// Add authorization header if API key is configured
    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {api_key}"))
        } else {
            request
        }
    }

    /// Parse error response from API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.to_owned(),
            |parsed| {
                format!(
                    "{} - {}",
                    parsed.error.error_type.as_deref().unwrap_or("unknown"),
                    parsed.error.message
                )
            },
        );
        upstream_status_error(service_names::OPENAI_COMPATIBLE, status, &detail)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.backend().0
    }

    fn display_name(&self) -> &'static str {
        self.config.backend().1
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(llm.provider = self.name(), llm.messages = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let openai_request = OpenAiRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(
            "Sending chat completion request with {} messages",
            openai_request.messages.len()
        );

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&openai_request);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to {}: {e}", self.config.base_url);
                upstream_transport_error(service_names::OPENAI_COMPATIBLE, &e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| upstream_transport_error(service_names::OPENAI_COMPATIBLE, &e))?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse API response: {e}");
            AppError::external_service(
                service_names::OPENAI_COMPATIBLE,
                format!("Failed to parse response: {e}"),
            )
        })?;

        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(service_names::OPENAI_COMPATIBLE, "API returned no choices")
        })?;

        let content = choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                AppError::external_service(
                    service_names::OPENAI_COMPATIBLE,
                    "Response contained no content",
                )
            })?;

        Ok(ChatResponse {
            content,
            model: openai_response.model,
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let response = self
            .add_auth_header(self.client.get(self.api_url("models")))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                debug!("Health check failed: {e}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        let config = OpenAiCompatibleConfig::default();
        assert_eq!(config.backend().0, "ollama");

        let vllm = OpenAiCompatibleConfig {
            base_url: "http://localhost:8000/v1".to_owned(),
            ..OpenAiCompatibleConfig::default()
        };
        assert_eq!(vllm.backend().0, "vllm");
    }

    #[test]
    fn test_system_prompt_leads_messages() {
        let request = ChatRequest::new(vec![ChatMessage::user("안녕")]).with_system("persona");
        let messages = OpenAiCompatibleProvider::convert_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"rate_limit"}}"#;
        let error = OpenAiCompatibleProvider::parse_error_response(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            body,
        );
        assert!(error.code.is_transient());
        assert!(error.message.contains("Rate limit reached"));
    }
}
