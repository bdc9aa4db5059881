// ABOUTME: WebSocket notification hub for real-time delivery of agent replies
// ABOUTME: Tracks connections and their per-user rooms and fans out JSON frames to them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `WebSocket` support for real-time updates
//!
//! A client joins the room of a user (`user_<id>`) by presenting a token
//! issued to that user; every reply produced for that user is pushed to each
//! connection in the room as a `new_message` frame. Connections whose outbound channel is closed are dropped the next
//! time a send to them fails.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::constants::realtime::USER_ROOM_PREFIX;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;

/// Frames sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Subscribe this connection to a user's notifications
    JoinRoom {
        /// User whose replies should be delivered
        #[serde(rename = "userId")]
        user_id: String,
        /// Token issued to `user_id` at register or login
        #[serde(default)]
        token: Option<String>,
    },
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Room membership confirmed
    Joined {
        /// Room name
        room: String,
    },
    /// A new conversation message
    NewMessage {
        /// Producer of the message, `"agent"` for persona replies
        from: String,
        /// Message text
        message: String,
        /// When the message was produced
        timestamp: DateTime<Utc>,
    },
    /// Request could not be handled
    Error {
        /// Error description
        message: String,
    },
}

impl ServerFrame {
    /// Agent reply notification stamped with the current time
    #[must_use]
    pub fn agent_message(message: impl Into<String>) -> Self {
        Self::NewMessage {
            from: "agent".to_owned(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Room name for a user's notifications
#[must_use]
pub fn user_room(user_id: &str) -> String {
    format!("{USER_ROOM_PREFIX}{user_id}")
}

#[derive(Debug)]
struct Connection {
    rooms: HashSet<String>,
    tx: UnboundedSender<String>,
}

/// Registry of live connections and the rooms they joined
#[derive(Debug)]
pub struct NotificationHub {
    auth_manager: Arc<AuthManager>,
    connections: RwLock<HashMap<Uuid, Connection>>,
}

impl NotificationHub {
    /// Create an empty hub that admits room joins signed by `auth_manager`
    #[must_use]
    pub fn new(auth_manager: Arc<AuthManager>) -> Self {
        Self {
            auth_manager,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection; the receiver yields serialized outbound frames
    pub async fn register(&self) -> (Uuid, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        self.connections.write().await.insert(
            connection_id,
            Connection {
                rooms: HashSet::new(),
                tx,
            },
        );
        debug!(connection.id = %connection_id, "WebSocket connection registered");
        (connection_id, rx)
    }

    /// Remove a connection and all of its memberships
    pub async fn unregister(&self, connection_id: Uuid) {
        if self.connections.write().await.remove(&connection_id).is_some() {
            debug!(connection.id = %connection_id, "WebSocket connection removed");
        }
    }

    /// Put a connection in `user_id`'s room and return the room name
    ///
    /// # Errors
    ///
    /// - `AuthRequired` without a token
    /// - `AuthInvalid`/`AuthExpired` for a rejected token
    /// - `PermissionDenied` when the token belongs to another user
    /// - `ResourceNotFound` for an unknown connection
    pub async fn join_room(
        &self,
        connection_id: Uuid,
        user_id: &str,
        token: Option<&str>,
    ) -> AppResult<String> {
        let token = token
            .map(|t| t.strip_prefix("Bearer ").unwrap_or(t))
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::auth_required)?;
        let subject = self.auth_manager.user_id_from_token(token)?;
        if Uuid::parse_str(user_id).ok() != Some(subject) {
            AppLogger::log_security_event(
                "websocket_foreign_room",
                &format!("connection {connection_id} attempted to join the room of {user_id}"),
                Some(&subject.to_string()),
            );
            return Err(AppError::permission_denied("Cannot join another user's room"));
        }

        let room = user_room(&subject.to_string());
        let mut connections = self.connections.write().await;
        let connection = connections
            .get_mut(&connection_id)
            .ok_or_else(|| AppError::not_found("Connection"))?;
        connection.rooms.insert(room.clone());
        info!(connection.id = %connection_id, room = %room, "Joined room");
        Ok(room)
    }

    /// Send a frame to one connection
    pub async fn send_to_connection(&self, connection_id: Uuid, frame: &ServerFrame) -> bool {
        let Ok(text) = serde_json::to_string(frame) else {
            return false;
        };
        let delivered = self
            .connections
            .read()
            .await
            .get(&connection_id)
            .is_some_and(|connection| connection.tx.send(text).is_ok());
        if !delivered {
            self.unregister(connection_id).await;
        }
        delivered
    }

    /// Fan `frame` out to every connection in `user_id`'s room.
    /// Returns how many connections accepted it.
    pub async fn notify_user(&self, user_id: &str, frame: &ServerFrame) -> usize {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize notification frame");
                return 0;
            }
        };
        let room = user_room(user_id);

        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let connections = self.connections.read().await;
            for (id, connection) in connections.iter().filter(|(_, c)| c.rooms.contains(&room)) {
                if connection.tx.send(text.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &dead {
                connections.remove(id);
            }
            warn!(room = %room, pruned = dead.len(), "Pruned closed WebSocket connections");
        }

        debug!(room = %room, delivered, "Notification fanned out");
        delivered
    }

    /// Live connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Members of `user_id`'s room
    pub async fn room_size(&self, user_id: &str) -> usize {
        let room = user_room(user_id);
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.rooms.contains(&room))
            .count()
    }

    /// Drive one upgraded socket until it closes
    pub async fn handle_connection(&self, socket: WebSocket) {
        let (mut ws_tx, mut ws_rx) = socket.split();
        let (connection_id, mut rx) = self.register().await;

        let send_task = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if ws_tx.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        while let Some(message) = ws_rx.next().await {
            match message {
                Ok(Message::Text(text)) => self.handle_client_text(connection_id, &text).await,
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }

        self.unregister(connection_id).await;
        send_task.abort();
    }

    /// Apply one client frame
    pub async fn handle_client_text(&self, connection_id: Uuid, text: &str) {
        let reply = match serde_json::from_str::<ClientFrame>(text) {
            Ok(ClientFrame::JoinRoom { user_id, .. }) if user_id.trim().is_empty() => {
                ServerFrame::Error {
                    message: "userId must not be empty".to_owned(),
                }
            }
            Ok(ClientFrame::JoinRoom { user_id, token }) => {
                match self.join_room(connection_id, &user_id, token.as_deref()).await {
                    Ok(room) => ServerFrame::Joined { room },
                    Err(e) if e.code == ErrorCode::ResourceNotFound => return,
                    Err(e) => {
                        warn!(connection.id = %connection_id, error = %e, "Room join rejected");
                        ServerFrame::Error { message: e.message }
                    }
                }
            }
            Err(e) => ServerFrame::Error {
                message: format!("Invalid message format: {e}"),
            },
        };
        self.send_to_connection(connection_id, &reply).await;
    }
}
