// ABOUTME: SQLite storage layer for users, health records, subscriptions and conversation turns
// ABOUTME: Owns the connection pool, schema migrations and shared row conversion helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! A single [`Database`] handle wraps the `SQLite` pool. Each entity gets its
//! own file with an `impl Database` block holding its migration and queries.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text with microsecond
//! precision, so lexical order matches chronological order and
//! `ORDER BY created_at DESC` needs no date parsing inside `SQLite`.

mod conversations;
mod health;
mod subscriptions;
mod users;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::ProfileSnapshot;
use crate::constants::database::MAX_CONNECTIONS;
use crate::errors::{AppError, AppResult};

/// Storage handle shared across services and routes
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and run migrations
    ///
    /// `sqlite::memory:` is pinned to a single never-recycled connection,
    /// since every new in-memory connection would open an empty database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the URL is invalid, the connection fails or
    /// a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let is_memory = database_url.contains(":memory:");
        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        info!(memory = is_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create all tables and indexes. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_health_records().await?;
        self.migrate_subscriptions().await?;
        self.migrate_conversations().await?;
        debug!("Database migrations complete");
        Ok(())
    }

    /// Load everything the persona needs in one call
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown user, `DatabaseError` otherwise
    pub async fn load_profile_snapshot(&self, user_id: Uuid) -> AppResult<ProfileSnapshot> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let latest_health_record = self.latest_health_record(user_id).await?;
        let active_subscription = self.latest_active_subscription(user_id).await?;

        Ok(ProfileSnapshot {
            user,
            latest_health_record,
            active_subscription,
        })
    }

    async fn execute_ddl(&self, statement: &str, what: &str) -> AppResult<()> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create {what}: {e}")))?;
        Ok(())
    }
}

/// Fixed-width storage form of a timestamp
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Corrupt timestamp '{value}': {e}")))
}

pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Corrupt id '{value}': {e}")))
}

/// Parse an enum column, reporting bad values as storage corruption
pub(crate) fn parse_column<T>(value: &str, column: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    value
        .parse()
        .map_err(|e: AppError| AppError::database(format!("Corrupt {column} '{value}': {}", e.message)))
}
