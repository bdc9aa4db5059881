// ABOUTME: Main library entry point for the companion chat server
// ABOUTME: Exposes the conversation pipeline, storage, auth and HTTP surface to binaries and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Companion Server
//!
//! Backend for a health and savings companion app. The user chats with a
//! persona of their own future self; every reply is conditioned on the
//! user's profile, latest vitals and active subscription, and every message
//! is filed under a topic so history can be browsed by category.
//!
//! ## Architecture
//!
//! - **Chat**: profile summarizer, message classifier, persona prompt
//!   builder and context window assembler
//! - **Services**: the chat orchestrator, health analysis and subscription
//!   enrollment
//! - **LLM**: provider trait with Anthropic and `OpenAI`-compatible backends
//! - **Database**: `SQLite` storage through sqlx
//! - **Routes**: axum HTTP handlers plus the `WebSocket` notification channel
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use companion_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Companion server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Token issuance and the bearer-token extractor
pub mod auth;

/// Conversation building blocks: summarizer, classifier, persona prompt, context window
pub mod chat;

/// Environment-driven configuration
pub mod config;

/// Server-level defaults and re-exported domain constants
pub mod constants;

/// `SQLite` storage for users, vitals, subscriptions and conversation turns
pub mod database;

/// Unified error types
pub mod errors;

/// Model provider abstraction and implementations
pub mod llm;

/// Logging setup and structured application events
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// HTTP route handlers
pub mod routes;

/// Business logic shared by routes
pub mod services;

/// Real-time notification hub
pub mod websocket;
