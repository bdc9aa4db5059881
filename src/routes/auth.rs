// ABOUTME: Registration and login route handlers
// ABOUTME: Creates users keyed by phone number and issues bearer tokens for the mobile client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! There are no passwords: a phone number identifies the user, and the
//! returned token must accompany every data request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate};
use companion_core::models::User;
use serde::{Deserialize, Serialize};

use super::{require, ServerResources};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    pub name: Option<String>,
    /// Phone number, unique per user
    pub phone: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub birth_date: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Registered phone number
    pub phone: Option<String>,
}

/// Response to a successful registration or login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Always `true`
    pub success: bool,
    /// The authenticated user
    pub user: User,
    /// Bearer token
    pub token: String,
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create registration and login routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let name = non_blank(require(request.name, "name")?, "name")?;
        let phone = non_blank(require(request.phone, "phone")?, "phone")?;
        let birth_date = parse_birth_date(&require(request.birth_date, "birthDate")?)?;

        let user = User::new(name, birth_date, phone);
        if let Err(e) = resources.database.create_user(&user).await {
            AppLogger::log_auth_event(&user.id.to_string(), "register", false);
            return Err(e);
        }

        let token = resources.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.id.to_string(), "register", true);

        let response = AuthResponse {
            success: true,
            user,
            token,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Json<AuthResponse>, AppError> {
        let phone = non_blank(require(request.phone, "phone")?, "phone")?;

        let Some(user) = resources.database.get_user_by_phone(&phone).await? else {
            AppLogger::log_auth_event("unknown", "login", false);
            return Err(AppError::not_found("User"));
        };

        let token = resources.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.id.to_string(), "login", true);

        Ok(Json(AuthResponse {
            success: true,
            user,
            token,
        }))
    }
}

fn non_blank(value: String, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::missing_field(field))
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Accept a plain date or a full timestamp, keeping only the date part
fn parse_birth_date(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|timestamp| timestamp.date_naive()))
        .map_err(|_| {
            AppError::new(
                ErrorCode::InvalidFormat,
                format!("birthDate must be YYYY-MM-DD: {raw}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birth_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1985, 3, 15).unwrap();
        assert_eq!(parse_birth_date("1985-03-15").unwrap(), expected);
        assert_eq!(
            parse_birth_date("1985-03-15T00:00:00.000Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_birth_date("15/03/1985").unwrap_err().code,
            ErrorCode::InvalidFormat
        );
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert_eq!(non_blank("  김철수 ".to_owned(), "name").unwrap(), "김철수");
        assert_eq!(
            non_blank("   ".to_owned(), "phone").unwrap_err().code,
            ErrorCode::MissingRequiredField
        );
    }
}
