// ABOUTME: User management database operations
// ABOUTME: Handles registration storage and lookup by id or phone number
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;
use companion_core::models::User;
use sqlx::sqlite::SqliteRow;
use sqlx::{Error as SqlxError, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                birth_date TEXT NOT NULL,
                phone TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
            "users table",
        )
        .await
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the phone number is taken,
    /// `DatabaseError` for any other failure
    pub async fn create_user(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r"
            INSERT INTO users (id, name, birth_date, phone, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(user.birth_date.to_string())
        .bind(&user.phone)
        .bind(format_timestamp(user.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(SqlxError::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::already_exists(format!("Phone number {} is already registered", user.phone)),
            ),
            Err(e) => Err(AppError::database(format!("Failed to create user: {e}"))),
        }
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, birth_date, phone, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by phone number
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_user_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, birth_date, phone, created_at FROM users WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by phone: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let birth_date: String = row.get("birth_date");
    Ok(User {
        id: parse_uuid(row.get("id"))?,
        name: row.get("name"),
        birth_date: NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d").map_err(|e| {
            AppError::database(format!("Corrupt birth_date '{birth_date}': {e}"))
        })?,
        phone: row.get("phone"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
