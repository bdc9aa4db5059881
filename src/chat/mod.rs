// ABOUTME: Conversation core building blocks for the companion persona
// ABOUTME: Classifier, profile summarizer, persona template and context window assembly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Conversation Core
//!
//! Pure, independently testable pieces that the chat orchestration service
//! composes for each inbound message:
//!
//! - [`classify`] assigns a topic to a message
//! - [`summarize`] turns raw user state into display-ready profile fields
//! - [`PromptTemplate`] renders those fields into the persona system prompt
//! - [`build_context_window`] orders recent turns for the model

mod classifier;
mod context;
mod persona;
mod profile;

pub use classifier::{classify, KEYWORD_RULES};
pub use context::{assemble_context, build_context_window};
pub use persona::{Placeholder, PromptTemplate};
pub use profile::{
    age_on, format_blood_pressure, format_subscription, local_date, summarize, ProfileSnapshot,
    ProfileSummary,
};
