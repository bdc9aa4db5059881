// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use crate::constants::{auth, chat, database, llm, ports};
use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Deployed service
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error for URL schemes other than `sqlite:`
    pub fn parse_url(s: &str) -> Result<Self> {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.contains("://") {
            Err(anyhow!("Unsupported database URL scheme: {s}"))
        } else {
            // Fallback: treat as SQLite file path
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from(
                database::DEFAULT_DATABASE_URL
                    .strip_prefix("sqlite:")
                    .unwrap_or(database::DEFAULT_DATABASE_URL),
            ),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Which model backend serves chat completions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// Any server speaking the `OpenAI` chat completions protocol
    OpenAiCompatible,
}

impl LlmProviderType {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openai" | "openai-compatible" | "openai_compatible" | "local" | "ollama" => {
                Self::OpenAiCompatible
            }
            _ => Self::Anthropic,
        }
    }
}

impl fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAiCompatible => write!(f, "openai"),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Model provider configuration
    pub llm: LlmConfig,
    /// Conversation pipeline configuration
    pub chat: ChatConfig,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location; the schema is created on connect
    pub url: DatabaseUrl,
}

/// Token issuance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret; generated at startup outside production when absent
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    /// Token lifetime in days
    pub jwt_expiry_days: i64,
}

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Selected backend
    pub provider: LlmProviderType,
    /// Model override; provider default when unset
    pub model: Option<String>,
    /// Anthropic API key
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
    /// Anthropic API base URL
    pub anthropic_base_url: String,
    /// Anthropic API version header
    pub anthropic_version: String,
    /// OpenAI-compatible base URL
    pub openai_compat_base_url: String,
    /// OpenAI-compatible API key, if the server wants one
    #[serde(skip_serializing)]
    pub openai_compat_api_key: Option<String>,
}

/// Conversation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Prior turns handed to the model
    pub context_window: usize,
    /// Completion cap
    pub max_output_tokens: u32,
    /// Budget for the whole model step, retries included
    pub model_timeout_secs: u64,
    /// Retries after the first model attempt
    pub max_retries: u32,
    /// First backoff step
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling
    pub retry_max_delay_ms: u64,
    /// Alternative persona template file
    pub persona_template_path: Option<PathBuf>,
    /// Offset from UTC, in minutes, of the calendar used for "today"
    pub utc_offset_minutes: i32,
}

impl ChatConfig {
    /// Model step budget as a `Duration`
    #[must_use]
    pub const fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Calendar offset, or `None` when out of range
    #[must_use]
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_window: chat::DEFAULT_CONTEXT_WINDOW,
            max_output_tokens: chat::DEFAULT_MAX_OUTPUT_TOKENS,
            model_timeout_secs: chat::DEFAULT_MODEL_TIMEOUT_SECS,
            max_retries: chat::DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: chat::DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: chat::DEFAULT_RETRY_MAX_DELAY_MS,
            persona_template_path: None,
            utc_offset_minutes: chat::DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but unparsable, or validation fails
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let config = Self {
            http_port: parse_env("HTTP_PORT", ports::DEFAULT_HTTP_PORT)?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),

            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or(
                    "DATABASE_URL",
                    database::DEFAULT_DATABASE_URL,
                ))?,
            },

            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
                jwt_expiry_days: parse_env("JWT_EXPIRY_DAYS", auth::DEFAULT_JWT_EXPIRY_DAYS)?,
            },

            cors_origins: parse_origins(&env_var_or("CORS_ORIGINS", "*")),

            llm: LlmConfig {
                provider: LlmProviderType::from_str_or_default(&env_var_or(
                    "COMPANION_LLM_PROVIDER",
                    "anthropic",
                )),
                model: env::var("COMPANION_LLM_MODEL")
                    .ok()
                    .filter(|s| !s.is_empty()),
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|s| !s.is_empty()),
                anthropic_base_url: env_var_or("ANTHROPIC_BASE_URL", llm::ANTHROPIC_BASE_URL),
                anthropic_version: env_var_or("ANTHROPIC_VERSION", llm::ANTHROPIC_VERSION),
                openai_compat_base_url: env_var_or(
                    "OPENAI_COMPAT_BASE_URL",
                    llm::OPENAI_COMPAT_BASE_URL,
                ),
                openai_compat_api_key: env::var("OPENAI_COMPAT_API_KEY")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },

            chat: ChatConfig {
                context_window: parse_env("CHAT_CONTEXT_WINDOW", chat::DEFAULT_CONTEXT_WINDOW)?,
                max_output_tokens: parse_env(
                    "CHAT_MAX_OUTPUT_TOKENS",
                    chat::DEFAULT_MAX_OUTPUT_TOKENS,
                )?,
                model_timeout_secs: parse_env(
                    "CHAT_MODEL_TIMEOUT_SECS",
                    chat::DEFAULT_MODEL_TIMEOUT_SECS,
                )?,
                max_retries: parse_env("CHAT_MAX_RETRIES", chat::DEFAULT_MAX_RETRIES)?,
                retry_base_delay_ms: parse_env(
                    "CHAT_RETRY_BASE_DELAY_MS",
                    chat::DEFAULT_RETRY_BASE_DELAY_MS,
                )?,
                retry_max_delay_ms: parse_env(
                    "CHAT_RETRY_MAX_DELAY_MS",
                    chat::DEFAULT_RETRY_MAX_DELAY_MS,
                )?,
                persona_template_path: env::var("COMPANION_PERSONA_TEMPLATE_PATH")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from),
                utc_offset_minutes: parse_env(
                    "CHAT_UTC_OFFSET_MINUTES",
                    chat::DEFAULT_UTC_OFFSET_MINUTES,
                )?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when a setting would make the server misbehave
    pub fn validate(&self) -> Result<()> {
        if self.chat.context_window == 0 {
            return Err(anyhow!("CHAT_CONTEXT_WINDOW must be at least 1"));
        }
        if self.chat.max_output_tokens == 0 {
            return Err(anyhow!("CHAT_MAX_OUTPUT_TOKENS must be at least 1"));
        }
        if self.chat.model_timeout_secs == 0 {
            return Err(anyhow!("CHAT_MODEL_TIMEOUT_SECS must be at least 1"));
        }
        if self.chat.utc_offset().is_none() {
            return Err(anyhow!(
                "CHAT_UTC_OFFSET_MINUTES must be strictly between -1440 and 1440"
            ));
        }
        if self.chat.retry_base_delay_ms > self.chat.retry_max_delay_ms {
            return Err(anyhow!(
                "CHAT_RETRY_BASE_DELAY_MS cannot exceed CHAT_RETRY_MAX_DELAY_MS"
            ));
        }
        if self.auth.jwt_expiry_days <= 0 {
            return Err(anyhow!("JWT_EXPIRY_DAYS must be positive"));
        }

        match (&self.auth.jwt_secret, self.environment.is_production()) {
            (None, true) => return Err(anyhow!("JWT_SECRET is required in production")),
            (Some(secret), true) if secret.len() < auth::MIN_JWT_SECRET_BYTES => {
                return Err(anyhow!(
                    "JWT_SECRET must be at least {} bytes",
                    auth::MIN_JWT_SECRET_BYTES
                ));
            }
            (None, false) => warn!("JWT_SECRET not set, a random secret will be generated"),
            _ => {}
        }

        if self.llm.provider == LlmProviderType::Anthropic && self.llm.anthropic_api_key.is_none()
        {
            warn!("Anthropic provider selected but ANTHROPIC_API_KEY is missing");
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Companion Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - LLM Provider: {}\n\
             - LLM Model: {}\n\
             - Context Window: {} turns\n\
             - Max Output Tokens: {}\n\
             - Model Timeout: {}s ({} retries)\n\
             - Persona Template: {}",
            self.http_port,
            self.environment,
            if self.database.url.is_memory() {
                "SQLite (memory)"
            } else {
                "SQLite"
            },
            self.llm.provider,
            self.llm.model.as_deref().unwrap_or("provider default"),
            self.chat.context_window,
            self.chat.max_output_tokens,
            self.chat.model_timeout_secs,
            self.chat.max_retries,
            self.chat
                .persona_template_path
                .as_ref()
                .map_or_else(|| "built-in".to_owned(), |p| p.display().to_string()),
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        _ => Ok(default),
    }
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
