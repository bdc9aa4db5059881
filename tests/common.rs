// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, user creation, server resources and mock model providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `companion_server`

use std::collections::VecDeque;
use std::env;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use companion_core::models::{NewHealthRecord, RecordType, User};
use companion_server::auth::AuthManager;
use companion_server::chat::PromptTemplate;
use companion_server::config::{
    AuthConfig, ChatConfig, DatabaseConfig, DatabaseUrl, Environment, LlmConfig, LlmProviderType,
    ServerConfig,
};
use companion_server::constants::llm;
use companion_server::database::Database;
use companion_server::errors::{AppError, ErrorCode};
use companion_server::llm::{ChatRequest, ChatResponse, LlmProvider};
use companion_server::routes::ServerResources;
use companion_server::services::{ChatOrchestrator, OrchestratorConfig, RetryPolicy};
use companion_server::websocket::NotificationHub;
use tokio::time::sleep;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Secret shared by every test `AuthManager`
pub const TEST_JWT_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Fresh in-memory database with the schema applied
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    Ok(Arc::new(Database::new("sqlite::memory:").await?))
}

/// Insert a user
pub async fn create_test_user(
    database: &Database,
    name: &str,
    birth_date: (i32, u32, u32),
    phone: &str,
) -> Result<User> {
    let (y, m, d) = birth_date;
    let birth_date =
        NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    let user = User::new(name.to_owned(), birth_date, phone.to_owned());
    database.create_user(&user).await?;
    Ok(user)
}

/// Insert a daily blood pressure reading
pub async fn record_blood_pressure(database: &Database, user: &User, sys: i32, dia: i32) -> Result<()> {
    database
        .insert_health_record(
            user.id,
            &NewHealthRecord {
                blood_pressure_sys: Some(sys),
                blood_pressure_dia: Some(dia),
                ..NewHealthRecord::default()
            },
            RecordType::Daily,
        )
        .await?;
    Ok(())
}

/// Orchestrator settings that never wait: no retries, short deadline
pub fn fast_orchestrator_config() -> OrchestratorConfig {
    OrchestratorConfig {
        model_timeout: Duration::from_secs(5),
        retry: RetryPolicy::none(),
        ..OrchestratorConfig::default()
    }
}

/// Orchestrator with the built-in persona template
pub fn create_orchestrator(
    database: &Arc<Database>,
    provider: Arc<dyn LlmProvider>,
    config: OrchestratorConfig,
) -> ChatOrchestrator {
    ChatOrchestrator::new(
        Arc::clone(database),
        provider,
        Arc::new(PromptTemplate::builtin().unwrap()),
        config,
    )
}

/// Server configuration for tests
pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
        },
        auth: AuthConfig {
            jwt_secret: None,
            jwt_expiry_days: 30,
        },
        cors_origins: vec!["*".to_owned()],
        llm: LlmConfig {
            provider: LlmProviderType::OpenAiCompatible,
            model: None,
            anthropic_api_key: None,
            anthropic_base_url: llm::ANTHROPIC_BASE_URL.to_owned(),
            anthropic_version: llm::ANTHROPIC_VERSION.to_owned(),
            openai_compat_base_url: llm::OPENAI_COMPAT_BASE_URL.to_owned(),
            openai_compat_api_key: None,
        },
        chat: ChatConfig::default(),
    }
}

/// Full server resources around an in-memory database and `provider`
pub async fn create_test_resources(
    provider: Arc<dyn LlmProvider>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    let orchestrator = Arc::new(create_orchestrator(
        &database,
        provider,
        fast_orchestrator_config(),
    ));
    let auth_manager = Arc::new(AuthManager::new(TEST_JWT_SECRET, 30));
    Ok(Arc::new(ServerResources::new(
        database,
        Arc::clone(&auth_manager),
        orchestrator,
        Arc::new(NotificationHub::new(auth_manager)),
        Arc::new(test_server_config()),
    )))
}

fn response(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_owned(),
        model: "mock-model".to_owned(),
        usage: None,
        finish_reason: Some("stop".to_owned()),
    }
}

/// Replies from a script, in order, and records every request it receives
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Provider that answers with `replies` in turn, then `"네!"`
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> ChatRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "네!".to_owned());
        Ok(response(&reply))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Fails the first `failures` calls with `code`, then replies
pub struct FlakyProvider {
    failures: u32,
    code: ErrorCode,
    calls: AtomicU32,
}

impl FlakyProvider {
    /// Provider failing `failures` times before succeeding
    pub const fn new(failures: u32, code: ErrorCode) -> Self {
        Self {
            failures,
            code,
            calls: AtomicU32::new(0),
        }
    }

    /// Provider that never succeeds
    pub const fn always(code: ErrorCode) -> Self {
        Self::new(u32::MAX, code)
    }

    /// Calls made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FlakyProvider {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn display_name(&self) -> &'static str {
        "Flaky"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(AppError::new(self.code, "simulated upstream failure"))
        } else {
            Ok(response("다시 연결됐어요!"))
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// Sleeps before replying
pub struct SleepingProvider {
    delay: Duration,
}

impl SleepingProvider {
    /// Provider that takes `delay` to answer
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl LlmProvider for SleepingProvider {
    fn name(&self) -> &'static str {
        "sleeping"
    }

    fn display_name(&self) -> &'static str {
        "Sleeping"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        sleep(self.delay).await;
        Ok(response("늦었네요"))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}
