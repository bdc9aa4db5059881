// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Chat orchestration, retry policy, health analysis and subscription enrollment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Protocol-agnostic business logic. Route handlers stay thin and delegate
//! here, so the same rules apply whichever surface calls them.

/// Per-message pipeline for the companion persona
pub mod chat_orchestration;

/// Health risk analysis over recent measurements
pub mod health_analysis;

/// Bounded retry with jittered exponential backoff
pub mod retry;

/// Subscription enrollment and coverage math
pub mod subscriptions;

pub use chat_orchestration::{validate_message, ChatOrchestrator, OrchestratorConfig};
pub use retry::RetryPolicy;
