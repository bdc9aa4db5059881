// ABOUTME: Route module organization for the companion server HTTP endpoints
// ABOUTME: Defines shared server resources and assembles the router with its middleware stack
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the companion server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the service layer. Handlers share one
//! [`ServerResources`] through axum state.

/// Registration and login routes
pub mod auth;
/// Chat and conversation history routes
pub mod conversations;
/// Service health routes
pub mod health;
/// Health record and analysis routes
pub mod health_records;
/// Subscription enrollment routes
pub mod subscriptions;
/// `WebSocket` routes for real-time notifications
pub mod websocket;

pub use auth::AuthRoutes;
pub use conversations::ConversationRoutes;
pub use health::HealthRoutes;
pub use health_records::HealthRecordRoutes;
pub use subscriptions::SubscriptionRoutes;
pub use websocket::WebSocketRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::{create_request_span, setup_cors};
use crate::services::ChatOrchestrator;
use crate::websocket::NotificationHub;

/// Extra time a request may take beyond the model step budget
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Long-lived dependencies shared by every handler
pub struct ServerResources {
    /// Storage
    pub database: Arc<Database>,
    /// Token issuer and validator
    pub auth_manager: Arc<AuthManager>,
    /// Conversation pipeline
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Real-time notification fan-out
    pub notifications: Arc<NotificationHub>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Bundle the server's dependencies
    #[must_use]
    pub const fn new(
        database: Arc<Database>,
        auth_manager: Arc<AuthManager>,
        orchestrator: Arc<ChatOrchestrator>,
        notifications: Arc<NotificationHub>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            database,
            auth_manager,
            orchestrator,
            notifications,
            config,
        }
    }
}

/// Build the complete application router
///
/// Layers, outermost first: request ID assignment, request tracing, request ID
/// propagation to the response, CORS and the overall request timeout.
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let request_timeout = resources.config.chat.model_timeout() + REQUEST_TIMEOUT_MARGIN;

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ConversationRoutes::routes(Arc::clone(&resources)))
        .merge(HealthRecordRoutes::routes(Arc::clone(&resources)))
        .merge(SubscriptionRoutes::routes(Arc::clone(&resources)))
        .merge(WebSocketRoutes::routes(Arc::clone(&resources.notifications)))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(setup_cors(&resources.config))
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

/// Parse a user id from a path segment or request body
pub(crate) fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::invalid_input(format!("Invalid userId: {raw}")))
}

/// Unwrap a required request field
pub(crate) fn require<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::missing_field(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_parse_user_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
        assert_eq!(
            parse_user_id("not-a-uuid").unwrap_err().code,
            ErrorCode::InvalidInput
        );
    }

    #[test]
    fn test_require_reports_field() {
        let error = require::<String>(None, "userId").unwrap_err();
        assert_eq!(error.code, ErrorCode::MissingRequiredField);
        assert!(error.message.contains("userId"));
    }
}
