// ABOUTME: Chat orchestration domain service for the companion persona
// ABOUTME: Assembles context, calls the model under a deadline, classifies and persists both turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{FixedOffset, Offset, Utc};
use companion_core::models::{AgentType, NewTurn, SenderRole};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::retry::RetryPolicy;
use crate::chat::{assemble_context, classify, local_date, summarize, PromptTemplate};
use crate::config::ChatConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::AppLogger;

/// Tunables for one orchestrator instance
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Persona whose history is read and written
    pub agent_type: AgentType,
    /// Prior turns handed to the model
    pub context_window: usize,
    /// Completion cap
    pub max_output_tokens: u32,
    /// Model override; provider default when unset
    pub model: Option<String>,
    /// Budget for the whole model step, retries included
    pub model_timeout: Duration,
    /// Backoff schedule for transient model failures
    pub retry: RetryPolicy,
    /// Calendar used to decide the user's age today
    pub utc_offset: FixedOffset,
}

impl OrchestratorConfig {
    /// Build from chat settings plus an optional model override
    #[must_use]
    pub fn from_chat_config(config: &ChatConfig, model: Option<String>) -> Self {
        Self {
            agent_type: AgentType::SelfPersona,
            context_window: config.context_window,
            max_output_tokens: config.max_output_tokens,
            model,
            model_timeout: config.model_timeout(),
            retry: RetryPolicy::from_chat_config(config),
            utc_offset: config.utc_offset().unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_chat_config(&ChatConfig::default(), None)
    }
}

/// Reject messages with no visible content
///
/// # Errors
///
/// Returns `InvalidInput` for empty or whitespace-only text
pub fn validate_message(message: &str) -> AppResult<()> {
    if message.trim().is_empty() {
        return Err(AppError::invalid_input("Message must not be empty"));
    }
    Ok(())
}

/// Per-message pipeline for the companion persona
///
/// Each call reads state, calls the model and appends exactly two turns or
/// nothing at all. Calls for different users share no mutable state.
pub struct ChatOrchestrator {
    database: Arc<Database>,
    provider: Arc<dyn LlmProvider>,
    template: Arc<PromptTemplate>,
    config: OrchestratorConfig,
}

impl ChatOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        provider: Arc<dyn LlmProvider>,
        template: Arc<PromptTemplate>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            database,
            provider,
            template,
            config,
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Produce the persona's reply to `message` and record both sides
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty message
    /// - `ResourceNotFound` for an unknown user
    /// - an upstream code when the model fails or exceeds its deadline
    /// - `DatabaseError` when reading state or committing the turns fails
    ///
    /// No turn is stored unless the whole exchange succeeds.
    #[instrument(skip(self, message), fields(user.id = %user_id, message_chars = message.chars().count()))]
    pub async fn chat(&self, user_id: Uuid, message: &str) -> AppResult<String> {
        validate_message(message)?;
        let started = Instant::now();

        let snapshot = self.database.load_profile_snapshot(user_id).await?;
        let summary = summarize(&snapshot, local_date(Utc::now(), self.config.utc_offset));
        let system_prompt = self.template.render(&summary);

        let mut messages = assemble_context(
            &self.database,
            user_id,
            self.config.agent_type,
            self.config.context_window,
        )
        .await?;
        debug!(history_turns = messages.len(), "Context window assembled");
        messages.push(ChatMessage::user(message));

        let mut request = ChatRequest::new(messages)
            .with_system(system_prompt)
            .with_max_tokens(self.config.max_output_tokens);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }

        let reply = self.complete_with_deadline(&request).await?;

        let user_category = classify(message);
        let reply_category = classify(&reply);

        self.database
            .append_turns(&[
                NewTurn {
                    user_id,
                    agent_type: self.config.agent_type,
                    sender_role: SenderRole::User,
                    message: message.to_owned(),
                    category: user_category,
                },
                NewTurn {
                    user_id,
                    agent_type: self.config.agent_type,
                    sender_role: SenderRole::Agent,
                    message: reply.clone(),
                    category: reply_category,
                },
            ])
            .await?;

        AppLogger::log_chat_exchange(
            &user_id.to_string(),
            user_category.as_str(),
            reply_category.as_str(),
            message.chars().count(),
            reply.chars().count(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        Ok(reply)
    }

    /// Model call with transient retries, bounded by `model_timeout` overall
    async fn complete_with_deadline(&self, request: &ChatRequest) -> AppResult<String> {
        let provider = self.provider.as_ref();
        let attempt = self
            .config
            .retry
            .run("llm.complete", || provider.complete(request));

        match timeout(self.config.model_timeout, attempt).await {
            Ok(Ok(response)) => {
                if let Some(usage) = response.usage {
                    debug!(
                        llm.provider = provider.name(),
                        llm.model = %response.model,
                        llm.total_tokens = usage.total_tokens,
                        "Model reply received"
                    );
                }
                Ok(response.content)
            }
            Ok(Err(e)) => {
                warn!(llm.provider = provider.name(), error = %e, "Model call failed");
                Err(e)
            }
            Err(_) => {
                warn!(
                    llm.provider = provider.name(),
                    timeout_ms = u64::try_from(self.config.model_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Model call exceeded deadline"
                );
                Err(AppError::external_timeout(
                    provider.display_name(),
                    format!(
                        "No reply within {} ms",
                        self.config.model_timeout.as_millis()
                    ),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_blank_messages_rejected() {
        assert_eq!(validate_message("").unwrap_err().code, ErrorCode::InvalidInput);
        assert_eq!(validate_message(" \n\t").unwrap_err().code, ErrorCode::InvalidInput);
        assert!(validate_message("안녕").is_ok());
    }

    #[test]
    fn test_default_config_matches_chat_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.agent_type, AgentType::SelfPersona);
        assert_eq!(config.context_window, 20);
        assert_eq!(config.max_output_tokens, 1000);
        assert!(config.model.is_none());
        assert_eq!(config.model_timeout, Duration::from_secs(60));
        assert_eq!(config.utc_offset.local_minus_utc(), 9 * 3600);
    }
}
