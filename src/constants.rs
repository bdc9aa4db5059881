// ABOUTME: System-wide constants and configuration defaults for the companion server
// ABOUTME: Re-exports domain constants from companion-core and adds server-level defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Server-level defaults live here; domain thresholds and sentinels live in
//! `companion_core::constants` and are re-exported for convenience.

pub use companion_core::constants::{chat, health, profile, realtime, subscription};

/// Service identification for logs and health responses
pub mod service_names {
    /// Name reported by the server binary
    pub const COMPANION_SERVER: &str = "companion-server";
    /// Name used in model-provider error messages
    pub const ANTHROPIC: &str = "Anthropic";
    /// Name used in model-provider error messages
    pub const OPENAI_COMPATIBLE: &str = "OpenAI-compatible";
}

/// Network defaults
pub mod ports {
    /// Default HTTP listen port
    pub const DEFAULT_HTTP_PORT: u16 = 3000;
}

/// Storage defaults
pub mod database {
    /// Default `SQLite` database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/companion.db";
    /// Connections kept by the pool for file databases
    pub const MAX_CONNECTIONS: u32 = 5;
}

/// Token issuance defaults
pub mod auth {
    /// Token lifetime in days
    pub const DEFAULT_JWT_EXPIRY_DAYS: i64 = 30;
    /// Audience claim stamped on every token
    pub const JWT_AUDIENCE: &str = "companion-mobile";
    /// Minimum accepted secret length in bytes
    pub const MIN_JWT_SECRET_BYTES: usize = 32;
}

/// Model provider defaults
pub mod llm {
    /// Anthropic API base URL
    pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
    /// Anthropic API version header value
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
    /// Default Anthropic model
    pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
    /// OpenAI-compatible base URL (local Ollama)
    pub const OPENAI_COMPAT_BASE_URL: &str = "http://localhost:11434/v1";
    /// Default OpenAI-compatible model
    pub const OPENAI_COMPAT_DEFAULT_MODEL: &str = "llama3.1:8b";
    /// Per-request HTTP timeout in seconds
    pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;
    /// Connection timeout in seconds
    pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
}
