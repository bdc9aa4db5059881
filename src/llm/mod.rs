// ABOUTME: LLM provider abstraction layer for pluggable conversational model integration
// ABOUTME: Defines the provider contract, message types, and upstream error classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Service Provider Interface
//!
//! The conversation pipeline never talks to a model API directly. It builds a
//! [`ChatRequest`] and hands it to an [`LlmProvider`], which makes the model
//! call an injectable capability: production wires in [`AnthropicProvider`] or
//! [`OpenAiCompatibleProvider`], tests wire in scripted mocks.
//!
//! ## Key Concepts
//!
//! - **`LlmProvider`**: Async trait for a single non-streaming chat completion
//! - **`ChatMessage`**: Role-based message structure for conversations
//! - **`ChatRequest`**: System prompt, ordered messages, model and output cap
//!
//! ## Example: Using a Provider
//!
//! ```rust,no_run
//! use companion_server::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let request = ChatRequest::new(vec![ChatMessage::user("오늘 산책했어요")])
//!         .with_system("당신은 사용자의 미래 자아입니다.")
//!         .with_max_tokens(1000);
//!     let response = provider.complete(&request).await;
//! }
//! ```

mod anthropic;
mod openai_compatible;
pub mod prompts;
mod provider;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use provider::ChatProvider;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System-level instruction, kept apart from the turn sequence
    pub system: Option<String>,
    /// Conversation messages in chronological order
    pub messages: Vec<ChatMessage>,
    /// Model identifier (provider-specific)
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            system: None,
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated message content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, etc.)
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// LLM provider trait for chat completion
///
/// Implementations must map every transport or provider failure onto one of
/// the upstream error codes so callers can tell retryable failures apart.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "anthropic", "ollama")
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &'static str;

    /// Default model to use if not specified in request
    fn default_model(&self) -> &str;

    /// Perform a chat completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;

    /// Check if the provider is reachable and credentials are accepted
    async fn health_check(&self) -> Result<bool, AppError>;
}

// ============================================================================
// Upstream error classification
// ============================================================================

/// Map a non-success HTTP status from a model API onto an upstream error
pub(crate) fn upstream_status_error(service: &str, status: StatusCode, detail: &str) -> AppError {
    let detail: String = detail.chars().take(300).collect();
    match status.as_u16() {
        401 | 403 => AppError::external_auth(service, format!("{status}: {detail}")),
        408 => AppError::external_timeout(service, format!("{status}: {detail}")),
        429 => AppError::external_rate_limited(service, format!("{status}: {detail}")),
        500..=599 => AppError::external_unavailable(service, format!("{status}: {detail}")),
        _ => AppError::external_service(service, format!("{status}: {detail}")),
    }
}

/// Map a transport failure from reqwest onto an upstream error
pub(crate) fn upstream_transport_error(service: &str, error: &reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::external_timeout(service, format!("Request timed out: {error}"))
    } else if error.is_connect() || error.is_request() {
        AppError::external_unavailable(service, format!("Failed to connect: {error}"))
    } else {
        AppError::external_service(service, format!("Request failed: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_status_classification() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, ErrorCode::ExternalRateLimited),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::ExternalServiceUnavailable),
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ExternalServiceUnavailable),
            (StatusCode::UNAUTHORIZED, ErrorCode::ExternalAuthFailed),
            (StatusCode::BAD_REQUEST, ErrorCode::ExternalServiceError),
            (StatusCode::REQUEST_TIMEOUT, ErrorCode::ExternalTimeout),
        ];
        for (status, code) in cases {
            let error = upstream_status_error("model", status, "detail");
            assert_eq!(error.code, code, "status {status}");
            assert!(error.is_upstream());
        }
    }

    #[test]
    fn test_overloaded_status_is_transient() {
        let overloaded = StatusCode::from_u16(529).unwrap();
        let error = upstream_status_error("Anthropic", overloaded, "overloaded_error");
        assert!(error.code.is_transient());
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_system("persona")
            .with_model("m")
            .with_max_tokens(1000);
        assert_eq!(request.system.as_deref(), Some("persona"));
        assert_eq!(request.model.as_deref(), Some("m"));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.messages.len(), 1);
    }
}
