// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Mutates process environment, so every test runs serially
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use companion_server::config::{DatabaseUrl, Environment, LlmProviderType, ServerConfig};
use serial_test::serial;

const CONFIG_VARS: &[&str] = &[
    "HTTP_PORT",
    "ENVIRONMENT",
    "DATABASE_URL",
    "JWT_SECRET",
    "JWT_EXPIRY_DAYS",
    "CORS_ORIGINS",
    "COMPANION_LLM_PROVIDER",
    "COMPANION_LLM_MODEL",
    "ANTHROPIC_API_KEY",
    "OPENAI_COMPAT_BASE_URL",
    "CHAT_CONTEXT_WINDOW",
    "CHAT_MAX_OUTPUT_TOKENS",
    "CHAT_MODEL_TIMEOUT_SECS",
    "CHAT_MAX_RETRIES",
    "CHAT_RETRY_BASE_DELAY_MS",
    "CHAT_RETRY_MAX_DELAY_MS",
    "COMPANION_PERSONA_TEMPLATE_PATH",
    "CHAT_UTC_OFFSET_MINUTES",
];

fn clear_env() {
    for var in CONFIG_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_unset() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 3000);
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(
        config.database.url,
        DatabaseUrl::SQLite {
            path: PathBuf::from("./data/companion.db")
        }
    );
    assert_eq!(config.cors_origins, vec!["*"]);
    assert_eq!(config.llm.provider, LlmProviderType::Anthropic);
    assert!(config.llm.model.is_none());
    assert_eq!(config.chat.context_window, 20);
    assert_eq!(config.chat.max_output_tokens, 1000);
    assert_eq!(config.chat.model_timeout(), Duration::from_secs(60));
    assert_eq!(config.chat.max_retries, 2);
    assert!(config.chat.persona_template_path.is_none());
    assert_eq!(config.chat.utc_offset_minutes, 540);
    assert_eq!(config.auth.jwt_expiry_days, 30);
}

#[test]
#[serial]
fn test_overrides_from_environment() {
    clear_env();
    env::set_var("HTTP_PORT", "8081");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("CORS_ORIGINS", "http://localhost:8081, https://app.example.com");
    env::set_var("COMPANION_LLM_PROVIDER", "openai");
    env::set_var("COMPANION_LLM_MODEL", "qwen2.5:14b");
    env::set_var("CHAT_CONTEXT_WINDOW", "6");
    env::set_var("CHAT_MODEL_TIMEOUT_SECS", "15");
    env::set_var("COMPANION_PERSONA_TEMPLATE_PATH", "/etc/companion/persona.md");
    env::set_var("CHAT_UTC_OFFSET_MINUTES", "-300");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http_port, 8081);
    assert!(config.database.url.is_memory());
    assert_eq!(
        config.cors_origins,
        vec!["http://localhost:8081", "https://app.example.com"]
    );
    assert_eq!(config.llm.provider, LlmProviderType::OpenAiCompatible);
    assert_eq!(config.llm.model.as_deref(), Some("qwen2.5:14b"));
    assert_eq!(config.chat.context_window, 6);
    assert_eq!(config.chat.model_timeout(), Duration::from_secs(15));
    assert_eq!(
        config.chat.persona_template_path,
        Some(PathBuf::from("/etc/companion/persona.md"))
    );
    assert_eq!(config.chat.utc_offset().unwrap().local_minus_utc(), -5 * 3600);
}

#[test]
#[serial]
fn test_unparsable_values_are_rejected() {
    clear_env();
    env::set_var("CHAT_CONTEXT_WINDOW", "twenty");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("CHAT_CONTEXT_WINDOW", "0");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("HTTP_PORT", "99999");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("CHAT_UTC_OFFSET_MINUTES", "1440");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_production_requires_jwt_secret() {
    clear_env();
    env::set_var("ENVIRONMENT", "production");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("JWT_SECRET", "x".repeat(48));
    let config = ServerConfig::from_env().unwrap();
    assert!(config.environment.is_production());
    clear_env();
}
