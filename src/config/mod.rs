// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration is read once from the environment at startup.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AuthConfig, ChatConfig, DatabaseConfig, DatabaseUrl, Environment, LlmConfig,
    LlmProviderType, ServerConfig,
};
