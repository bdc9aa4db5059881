// ABOUTME: Subscription route handlers for enrollment and listing
// ABOUTME: Derives coverage from the monthly amount and lists active enrollments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use companion_core::models::Subscription;
use serde::{Deserialize, Serialize};

use super::{parse_user_id, require, ServerResources};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::services::subscriptions;

/// Enrollment payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    /// Enrolling user
    pub user_id: Option<String>,
    /// Monthly contribution in won
    pub monthly_amount: Option<i64>,
}

/// New enrollment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollResponse {
    /// Always `true`
    pub success: bool,
    /// Stored subscription with derived coverage
    pub subscription: Subscription,
}

/// Active enrollments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    /// Always `true`
    pub success: bool,
    /// Newest first
    pub subscriptions: Vec<Subscription>,
}

/// Subscription routes implementation
pub struct SubscriptionRoutes;

impl SubscriptionRoutes {
    /// Create enrollment and listing routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/subscriptions", post(Self::handle_enroll))
            .route("/api/subscriptions/:user_id", get(Self::handle_list))
            .with_state(resources)
    }

    async fn handle_enroll(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Json(request): Json<EnrollRequest>,
    ) -> Result<Response, AppError> {
        let user_id = parse_user_id(&require(request.user_id, "userId")?)?;
        let monthly_amount = require(request.monthly_amount, "monthlyAmount")?;
        auth.ensure_owner(user_id)?;

        let subscription =
            subscriptions::enroll(&resources.database, user_id, monthly_amount).await?;

        Ok((
            StatusCode::CREATED,
            Json(EnrollResponse {
                success: true,
                subscription,
            }),
        )
            .into_response())
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthUser,
        Path(user_id): Path<String>,
    ) -> Result<Json<SubscriptionListResponse>, AppError> {
        let user_id = parse_user_id(&user_id)?;
        auth.ensure_owner(user_id)?;

        let subscriptions = resources.database.active_subscriptions(user_id).await?;

        Ok(Json(SubscriptionListResponse {
            success: true,
            subscriptions,
        }))
    }
}
