// ABOUTME: Health record route handlers for recording vitals and reading analysis
// ABOUTME: Stores daily snapshots, lists them newest first and serves the risk analysis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use companion_core::models::{HealthRecord, NewHealthRecord, RecordType};
use serde::{Deserialize, Serialize};

use super::{parse_user_id, require, ServerResources};
use crate::auth::AuthUser;
use crate::constants::health::DEFAULT_RECORD_LIMIT;
use crate::errors::{AppError, ErrorCode};
use crate::services::health_analysis::{self, HealthAnalysis};

/// Measurement payload; every vital is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHealthRequest {
    /// Measured user
    pub user_id: Option<String>,
    /// Measured values
    #[serde(flatten)]
    pub values: NewHealthRecord,
}

/// Stored measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHealthResponse {
    /// Always `true`
    pub success: bool,
    /// The new record
    pub record: HealthRecord,
}

/// Listing parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordListQuery {
    /// Maximum records to return
    pub limit: Option<i64>,
}

/// Recent measurements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordListResponse {
    /// Always `true`
    pub success: bool,
    /// Newest first
    pub records: Vec<HealthRecord>,
}

/// Analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Always `true`
    pub success: bool,
    /// Pressure band, trend and advice
    pub analysis: HealthAnalysis,
}

/// Health record routes implementation
pub struct HealthRecordRoutes;

impl HealthRecordRoutes {
    /// Create record and analysis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/health/records", post(Self::handle_record))
            .route("/api/health/records/:user_id", get(Self::handle_list))
            .route("/api/health/analysis/:user_id", get(Self::handle_analysis))
            .with_state(resources)
    }

    async fn handle_record(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Json(request): Json<RecordHealthRequest>,
    ) -> Result<Response, AppError> {
        let user_id = parse_user_id(&require(request.user_id, "userId")?)?;
        auth.ensure_owner(user_id)?;

        let record = resources
            .database
            .insert_health_record(user_id, &request.values, RecordType::Daily)
            .await?;

        Ok((
            StatusCode::CREATED,
            Json(RecordHealthResponse {
                success: true,
                record,
            }),
        )
            .into_response())
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Path(user_id): Path<String>,
        Query(query): Query<RecordListQuery>,
    ) -> Result<Json<RecordListResponse>, AppError> {
        let user_id = parse_user_id(&user_id)?;
        auth.ensure_owner(user_id)?;

        let limit = query.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
        if limit <= 0 {
            return Err(AppError::new(
                ErrorCode::ValueOutOfRange,
                "limit must be positive",
            ));
        }

        let records = resources
            .database
            .list_health_records(user_id, None, limit)
            .await?;

        Ok(Json(RecordListResponse {
            success: true,
            records,
        }))
    }

    async fn handle_analysis(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Path(user_id): Path<String>,
    ) -> Result<Json<AnalysisResponse>, AppError> {
        let user_id = parse_user_id(&user_id)?;
        auth.ensure_owner(user_id)?;

        let analysis = health_analysis::analyze_user(&resources.database, user_id).await?;

        Ok(Json(AnalysisResponse {
            success: true,
            analysis,
        }))
    }
}
