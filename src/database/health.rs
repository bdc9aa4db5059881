// ABOUTME: Health record database operations
// ABOUTME: Append-only measurement storage with newest-first queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use companion_core::models::{HealthRecord, NewHealthRecord, RecordType};
use sqlx::sqlite::SqliteRow;
use sqlx::{Error as SqlxError, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_column, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};

const RECORD_COLUMNS: &str = "id, user_id, blood_pressure_sys, blood_pressure_dia, blood_sugar, weight, record_type, recorded_at";

impl Database {
    pub(super) async fn migrate_health_records(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS health_records (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                blood_pressure_sys INTEGER,
                blood_pressure_dia INTEGER,
                blood_sugar INTEGER,
                weight REAL,
                record_type TEXT NOT NULL CHECK (record_type IN ('daily', 'checkup')),
                recorded_at TEXT NOT NULL
            )
            ",
            "health_records table",
        )
        .await?;

        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_health_records_user_time ON health_records(user_id, recorded_at DESC)",
            "health_records index",
        )
        .await
    }

    /// Append a measurement snapshot stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist,
    /// `DatabaseError` for any other failure
    pub async fn insert_health_record(
        &self,
        user_id: Uuid,
        values: &NewHealthRecord,
        record_type: RecordType,
    ) -> AppResult<HealthRecord> {
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id,
            blood_pressure_sys: values.blood_pressure_sys,
            blood_pressure_dia: values.blood_pressure_dia,
            blood_sugar: values.blood_sugar,
            weight: values.weight,
            record_type,
            recorded_at: Utc::now(),
        };

        let result = sqlx::query(
            r"
            INSERT INTO health_records (id, user_id, blood_pressure_sys, blood_pressure_dia, blood_sugar, weight, record_type, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(record.id.to_string())
        .bind(user_id.to_string())
        .bind(record.blood_pressure_sys)
        .bind(record.blood_pressure_dia)
        .bind(record.blood_sugar)
        .bind(record.weight)
        .bind(record_type.as_str())
        .bind(format_timestamp(record.recorded_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(SqlxError::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(AppError::not_found("User"))
            }
            Err(e) => Err(AppError::database(format!("Failed to insert health record: {e}"))),
        }
    }

    /// Most recent measurement of any type
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn latest_health_record(&self, user_id: Uuid) -> AppResult<Option<HealthRecord>> {
        Ok(self.list_health_records(user_id, None, 1).await?.pop())
    }

    /// Up to `limit` measurements, newest first, optionally of one type
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_health_records(
        &self,
        user_id: Uuid,
        record_type: Option<RecordType>,
        limit: i64,
    ) -> AppResult<Vec<HealthRecord>> {
        let query = format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM health_records
            WHERE user_id = $1 AND ($2 IS NULL OR record_type = $2)
            ORDER BY recorded_at DESC, rowid DESC
            LIMIT $3
            "
        );

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .bind(record_type.map(RecordType::as_str))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list health records: {e}")))?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &SqliteRow) -> AppResult<HealthRecord> {
    Ok(HealthRecord {
        id: parse_uuid(row.get("id"))?,
        user_id: parse_uuid(row.get("user_id"))?,
        blood_pressure_sys: row.get("blood_pressure_sys"),
        blood_pressure_dia: row.get("blood_pressure_dia"),
        blood_sugar: row.get("blood_sugar"),
        weight: row.get("weight"),
        record_type: parse_column(row.get("record_type"), "record_type")?,
        recorded_at: parse_timestamp(row.get("recorded_at"))?,
    })
}
