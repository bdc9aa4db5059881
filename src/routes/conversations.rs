// ABOUTME: Conversation route handlers for chatting with the persona and reading history
// ABOUTME: Runs the chat orchestrator, pushes replies to the user's room and groups history by topic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Conversation routes
//!
//! `POST /api/conversations` is the only entry point into the chat pipeline.
//! The reply is returned in the response body and also delivered to every
//! socket that joined the user's room.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use companion_core::models::{Category, ConversationTurn};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_user_id, require, ServerResources};
use crate::auth::AuthUser;
use crate::constants::chat::HISTORY_LIMIT;
use crate::errors::AppError;
use crate::services::validate_message;
use crate::websocket::ServerFrame;

/// Chat message payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Speaking user
    pub user_id: Option<String>,
    /// Message text
    pub message: Option<String>,
}

/// Persona reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    /// Always `true`
    pub success: bool,
    /// Reply text
    pub message: String,
}

/// History filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Category slug, e.g. `health-checkup`
    pub category: Option<String>,
}

/// History grouped by category slug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Always `true`
    pub success: bool,
    /// Turns per category, newest first within each group
    pub conversations: BTreeMap<String, Vec<ConversationTurn>>,
}

/// Conversation routes implementation
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Create chat and history routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/conversations", post(Self::handle_send_message))
            .route(
                "/api/conversations/history/:user_id",
                get(Self::handle_history),
            )
            .with_state(resources)
    }

    async fn handle_send_message(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Json<SendMessageResponse>, AppError> {
        let user_id = parse_user_id(&require(request.user_id, "userId")?)?;
        let message = require(request.message, "message")?;
        auth.ensure_owner(user_id)?;
        validate_message(&message)?;

        let reply = resources.orchestrator.chat(user_id, &message).await?;

        let delivered = resources
            .notifications
            .notify_user(&user_id.to_string(), &ServerFrame::agent_message(reply.clone()))
            .await;
        debug!(user.id = %user_id, delivered, "Reply pushed to socket room");

        Ok(Json(SendMessageResponse {
            success: true,
            message: reply,
        }))
    }

    async fn handle_history(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Path(user_id): Path<String>,
        Query(query): Query<HistoryQuery>,
    ) -> Result<Json<HistoryResponse>, AppError> {
        let user_id = parse_user_id(&user_id)?;
        auth.ensure_owner(user_id)?;

        let category = query
            .category
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .map(str::parse::<Category>)
            .transpose()?;

        let turns = resources
            .database
            .conversation_history(user_id, category, HISTORY_LIMIT)
            .await?;

        Ok(Json(HistoryResponse {
            success: true,
            conversations: group_by_category(turns),
        }))
    }
}

/// Bucket turns by category slug, preserving their order within each bucket
#[must_use]
pub fn group_by_category(turns: Vec<ConversationTurn>) -> BTreeMap<String, Vec<ConversationTurn>> {
    let mut groups: BTreeMap<String, Vec<ConversationTurn>> = BTreeMap::new();
    for turn in turns {
        groups
            .entry(turn.category.as_str().to_owned())
            .or_default()
            .push(turn);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use companion_core::models::{AgentType, SenderRole};
    use uuid::Uuid;

    fn turn(message: &str, category: Category) -> ConversationTurn {
        ConversationTurn {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            agent_type: AgentType::SelfPersona,
            sender_role: SenderRole::User,
            message: message.to_owned(),
            category,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_grouping_keeps_order_within_group() {
        let groups = group_by_category(vec![
            turn("newest", Category::Report),
            turn("middle", Category::ClinicalCare),
            turn("oldest", Category::Report),
        ]);

        assert_eq!(groups.len(), 2);
        let reports: Vec<&str> = groups["report"].iter().map(|t| t.message.as_str()).collect();
        assert_eq!(reports, ["newest", "oldest"]);
        assert_eq!(groups["clinical-care"].len(), 1);
    }
}
