// ABOUTME: Server binary for the companion chat backend
// ABOUTME: Loads configuration, wires storage, auth, model provider and routes, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Companion Server Binary
//!
//! Configuration comes from the environment (and `.env`); command-line flags
//! override the listen port and database location.

use std::future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use companion_server::auth::AuthManager;
use companion_server::chat::PromptTemplate;
use companion_server::config::{DatabaseUrl, ServerConfig};
use companion_server::database::Database;
use companion_server::llm::{ChatProvider, LlmProvider};
use companion_server::logging;
use companion_server::routes::{build_router, ServerResources};
use companion_server::services::{ChatOrchestrator, OrchestratorConfig};
use companion_server::websocket::NotificationHub;
use tokio::fs;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "companion-server")]
#[command(about = "Companion API - future-self persona chat for health and savings")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url.as_deref() {
        config.database.url = DatabaseUrl::parse_url(database_url)?;
    }
    config.validate()?;

    info!("Starting companion server");
    info!("{}", config.summary());

    if let DatabaseUrl::SQLite { path } = &config.database.url {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let database = Arc::new(Database::new(&config.database.url.to_connection_string()).await?);
    info!("Database initialized: {}", config.database.url);

    let auth_manager = Arc::new(AuthManager::from_config(&config.auth, config.environment)?);

    let provider: Arc<dyn LlmProvider> = Arc::new(ChatProvider::from_config(&config.llm)?);
    if !provider.health_check().await.unwrap_or(false) {
        warn!(
            llm.provider = provider.name(),
            "Model provider did not pass its health check; chat requests may fail"
        );
    }

    let template = Arc::new(PromptTemplate::from_optional_path(
        config.chat.persona_template_path.as_deref(),
    )?);

    let orchestrator = Arc::new(ChatOrchestrator::new(
        Arc::clone(&database),
        provider,
        template,
        OrchestratorConfig::from_chat_config(&config.chat, config.llm.model.clone()),
    ));

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        database,
        Arc::clone(&auth_manager),
        orchestrator,
        Arc::new(NotificationHub::new(auth_manager)),
        Arc::new(config),
    ));
    let app = build_router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Companion server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Companion server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        // Without a signal handler the server runs until killed
        future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
