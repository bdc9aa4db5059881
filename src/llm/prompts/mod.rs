// ABOUTME: System prompt templates for LLM interactions loaded at compile time
// ABOUTME: Provides the future-self companion persona template with profile placeholders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! Templates are loaded at compile time from markdown files for easy
//! maintenance. Placeholders use `{name}` syntax and are filled by
//! [`crate::chat::PromptTemplate`].

/// Future-self persona template
///
/// Fixes persona, tone register, the 1-3 sentence length rule, deferral of
/// medical diagnosis to the AI doctor, and the safety-first directive.
pub const SELF_PERSONA_PROMPT: &str = include_str!("self_persona.md");
