// ABOUTME: WebSocket route handler for real-time reply notifications
// ABOUTME: Upgrades the connection and hands it to the notification hub
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::{debug, info};

use crate::websocket::NotificationHub;

/// WebSocket routes implementation
pub struct WebSocketRoutes;

impl WebSocketRoutes {
    /// Create the `WebSocket` route with the shared hub
    pub fn routes(hub: Arc<NotificationHub>) -> Router {
        Router::new()
            .route("/ws", get(Self::handle_websocket))
            .with_state(hub)
    }

    /// Upgrade the HTTP connection and delegate to the hub, which handles
    /// room joins and delivery
    async fn handle_websocket(
        ws: WebSocketUpgrade,
        State(hub): State<Arc<NotificationHub>>,
    ) -> impl IntoResponse {
        info!("New WebSocket connection request");

        ws.on_upgrade(move |socket: WebSocket| async move {
            debug!("WebSocket upgraded, delegating to notification hub");
            hub.handle_connection(socket).await;
        })
    }
}
