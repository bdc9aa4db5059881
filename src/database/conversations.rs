// ABOUTME: Conversation turn database operations
// ABOUTME: Append-only turn log with transactional batch append and newest-first windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use companion_core::models::{AgentType, Category, ConversationTurn, NewTurn};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{format_timestamp, parse_column, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};

impl Database {
    pub(super) async fn migrate_conversations(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS conversation_turns (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                agent_type TEXT NOT NULL,
                sender_role TEXT NOT NULL CHECK (sender_role IN ('user', 'agent')),
                message TEXT NOT NULL,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
            "conversation_turns table",
        )
        .await?;

        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_turns_user_agent_time ON conversation_turns(user_id, agent_type, created_at DESC)",
            "conversation_turns index",
        )
        .await
    }

    /// Latest `limit` turns for one persona, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn recent_turns(
        &self,
        user_id: Uuid,
        agent_type: AgentType,
        limit: usize,
    ) -> AppResult<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, agent_type, sender_role, message, category, created_at
            FROM conversation_turns
            WHERE user_id = $1 AND agent_type = $2
            ORDER BY created_at DESC, rowid DESC
            LIMIT $3
            ",
        )
        .bind(user_id.to_string())
        .bind(agent_type.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load recent turns: {e}")))?;

        rows.iter().map(row_to_turn).collect()
    }

    /// Latest `limit` turns across every persona, newest first, optionally
    /// restricted to one category
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn conversation_history(
        &self,
        user_id: Uuid,
        category: Option<Category>,
        limit: i64,
    ) -> AppResult<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, agent_type, sender_role, message, category, created_at
            FROM conversation_turns
            WHERE user_id = $1 AND ($2 IS NULL OR category = $2)
            ORDER BY created_at DESC, rowid DESC
            LIMIT $3
            ",
        )
        .bind(user_id.to_string())
        .bind(category.map(Category::as_str))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load conversation history: {e}")))?;

        rows.iter().map(row_to_turn).collect()
    }

    /// Append turns atomically, in slice order
    ///
    /// Either every turn is committed or none is. The transaction rolls back
    /// when dropped uncommitted, which covers every early return below.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any insert or the commit fails
    pub async fn append_turns(&self, turns: &[NewTurn]) -> AppResult<Vec<ConversationTurn>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let mut stored = Vec::with_capacity(turns.len());
        for turn in turns {
            let record = ConversationTurn {
                id: Uuid::new_v4(),
                user_id: turn.user_id,
                agent_type: turn.agent_type,
                sender_role: turn.sender_role,
                message: turn.message.clone(),
                category: turn.category,
                created_at: Utc::now(),
            };

            sqlx::query(
                r"
                INSERT INTO conversation_turns (id, user_id, agent_type, sender_role, message, category, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(record.id.to_string())
            .bind(record.user_id.to_string())
            .bind(record.agent_type.as_str())
            .bind(record.sender_role.as_str())
            .bind(&record.message)
            .bind(record.category.as_str())
            .bind(format_timestamp(record.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to append turn: {e}")))?;

            stored.push(record);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit turns: {e}")))?;

        debug!(db.operation = "append_turns", count = stored.len(), "Turns committed");
        Ok(stored)
    }
}

fn row_to_turn(row: &SqliteRow) -> AppResult<ConversationTurn> {
    Ok(ConversationTurn {
        id: parse_uuid(row.get("id"))?,
        user_id: parse_uuid(row.get("user_id"))?,
        agent_type: parse_column(row.get("agent_type"), "agent_type")?,
        sender_role: parse_column(row.get("sender_role"), "sender_role")?,
        message: row.get("message"),
        category: parse_column(row.get("category"), "category")?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
