// ABOUTME: Unified LLM provider selector for runtime provider switching
// ABOUTME: Abstracts over Anthropic and OpenAI-compatible providers based on configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Selector
//!
//! `COMPANION_LLM_PROVIDER` picks the backend:
//! - `anthropic` (default): Anthropic Messages API (requires `ANTHROPIC_API_KEY`)
//! - `openai`: any `OpenAI`-compatible endpoint (Ollama, vLLM, `LocalAI`)

use async_trait::async_trait;
use std::fmt;
use tracing::info;

use super::{
    AnthropicConfig, AnthropicProvider, ChatRequest, ChatResponse, LlmProvider,
    OpenAiCompatibleConfig, OpenAiCompatibleProvider,
};
use crate::config::{LlmConfig, LlmProviderType};
use crate::errors::AppError;

/// Unified chat provider that wraps the configured backend
pub enum ChatProvider {
    /// Anthropic Messages API
    Anthropic(AnthropicProvider),
    /// Any `OpenAI`-compatible endpoint
    OpenAiCompatible(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Create the provider selected by configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the selected provider is missing credentials or its
    /// HTTP client cannot be built
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        let provider = match config.provider {
            LlmProviderType::Anthropic => Self::Anthropic(AnthropicProvider::new(
                AnthropicConfig::from_llm_config(config)?,
            )?),
            LlmProviderType::OpenAiCompatible => Self::OpenAiCompatible(
                OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::from_llm_config(config))?,
            ),
        };

        info!(
            "LLM provider {} initialized with model: {}",
            provider.display_name(),
            provider.default_model()
        );

        Ok(provider)
    }

    fn inner(&self) -> &dyn LlmProvider {
        match self {
            Self::Anthropic(p) => p,
            Self::OpenAiCompatible(p) => p,
        }
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatProvider")
            .field("provider", &self.name())
            .field("model", &self.default_model())
            .finish()
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn default_model(&self) -> &str {
        self.inner().default_model()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.inner().complete(request).await
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        self.inner().health_check().await
    }
}
