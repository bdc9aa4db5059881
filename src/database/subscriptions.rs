// ABOUTME: Subscription database operations
// ABOUTME: Stores enrollments and lists active ones newest first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use companion_core::models::{Subscription, SubscriptionStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Error as SqlxError, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_column, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};

impl Database {
    pub(super) async fn migrate_subscriptions(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                monthly_amount INTEGER NOT NULL,
                coverage_amount INTEGER NOT NULL,
                coverage_ratio REAL NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('active', 'inactive')),
                started_at TEXT NOT NULL
            )
            ",
            "subscriptions table",
        )
        .await?;

        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_subscriptions_user_status ON subscriptions(user_id, status, started_at DESC)",
            "subscriptions index",
        )
        .await
    }

    /// Store a new enrollment
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist,
    /// `DatabaseError` for any other failure
    pub async fn create_subscription(&self, subscription: &Subscription) -> AppResult<()> {
        let result = sqlx::query(
            r"
            INSERT INTO subscriptions (id, user_id, monthly_amount, coverage_amount, coverage_ratio, status, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(subscription.id.to_string())
        .bind(subscription.user_id.to_string())
        .bind(subscription.monthly_amount)
        .bind(subscription.coverage_amount)
        .bind(subscription.coverage_ratio)
        .bind(subscription.status.as_str())
        .bind(format_timestamp(subscription.started_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(SqlxError::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(AppError::not_found("User"))
            }
            Err(e) => Err(AppError::database(format!("Failed to create subscription: {e}"))),
        }
    }

    /// Active subscriptions, most recently started first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn active_subscriptions(&self, user_id: Uuid) -> AppResult<Vec<Subscription>> {
        self.query_active_subscriptions(user_id, -1).await
    }

    /// The most recently started active subscription
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn latest_active_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.query_active_subscriptions(user_id, 1).await?.pop())
    }

    async fn query_active_subscriptions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, monthly_amount, coverage_amount, coverage_ratio, status, started_at
            FROM subscriptions
            WHERE user_id = $1 AND status = $2
            ORDER BY started_at DESC, rowid DESC
            LIMIT $3
            ",
        )
        .bind(user_id.to_string())
        .bind(SubscriptionStatus::Active.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list subscriptions: {e}")))?;

        rows.iter().map(row_to_subscription).collect()
    }
}

fn row_to_subscription(row: &SqliteRow) -> AppResult<Subscription> {
    Ok(Subscription {
        id: parse_uuid(row.get("id"))?,
        user_id: parse_uuid(row.get("user_id"))?,
        monthly_amount: row.get("monthly_amount"),
        coverage_amount: row.get("coverage_amount"),
        coverage_ratio: row.get("coverage_ratio"),
        status: parse_column(row.get("status"), "status")?,
        started_at: parse_timestamp(row.get("started_at"))?,
    })
}
