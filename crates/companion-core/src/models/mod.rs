// ABOUTME: Core data models for the companion server
// ABOUTME: Re-exports User, HealthRecord, Subscription and conversation types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Records are serialized in camelCase because the mobile client consumes them
//! directly from the REST endpoints.
//!
//! ## Core Models
//!
//! - `User`: registered person with a birth date and phone number
//! - `HealthRecord`: one vitals snapshot, append-only
//! - `Subscription`: monthly contribution with derived coverage
//! - `ConversationTurn`: one side of a chat exchange, append-only
//! - `Category`: topic bucket computed per message, never stored as an entity

mod conversation;
mod health;
mod subscription;
mod user;

pub use conversation::{AgentType, Category, ConversationTurn, NewTurn, SenderRole};
pub use health::{HealthRecord, NewHealthRecord, RecordType};
pub use subscription::{Subscription, SubscriptionStatus};
pub use user::User;
