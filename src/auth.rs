// ABOUTME: JWT-based user authentication for the mobile client
// ABOUTME: Issues and validates HS256 tokens and provides the bearer-token request extractor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Registration and login hand the client a signed token; data routes take an
//! [`AuthUser`] extractor that rejects missing, malformed, expired or foreign
//! tokens before the handler runs.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use chrono::{DateTime, Duration, Utc};
use companion_core::models::User;
use http::header::AUTHORIZATION;
use http::request::Parts;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{AuthConfig, Environment};
use crate::constants::auth::{JWT_AUDIENCE, MIN_JWT_SECRET_BYTES};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::routes::ServerResources;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Token signature or claims are invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is not a well-formed `JWT`
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExpired { expired_at } => write!(
                f,
                "JWT token expired at {}",
                expired_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Self::TokenInvalid { reason } => write!(f, "JWT token is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token is malformed: {details}"),
        }
    }
}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match error {
            JwtValidationError::TokenExpired { .. } => Self::auth_expired(),
            other => Self::auth_invalid(other.to_string()),
        }
    }
}

/// `JWT` claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Audience
    pub aud: String,
}

/// Token issuer and validator
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: Duration,
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("token_expiry_days", &self.token_expiry.num_days())
            .finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Create a manager from a shared secret
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry: Duration::days(token_expiry_days),
        }
    }

    /// Build from configuration, generating an ephemeral secret outside
    /// production when none is configured
    ///
    /// # Errors
    ///
    /// Returns a configuration error in production without a usable secret
    pub fn from_config(config: &AuthConfig, environment: Environment) -> AppResult<Self> {
        match &config.jwt_secret {
            Some(secret) => Ok(Self::new(secret.as_bytes(), config.jwt_expiry_days)),
            None if environment.is_production() => {
                Err(AppError::config("JWT_SECRET is required in production"))
            }
            None => {
                warn!("JWT_SECRET not set, using an ephemeral secret; tokens will not survive a restart");
                let mut secret = vec![0_u8; MIN_JWT_SECRET_BYTES * 2];
                rand::thread_rng().fill_bytes(&mut secret);
                Ok(Self::new(&secret, config.jwt_expiry_days))
            }
        }
    }

    /// Lifetime of newly issued tokens
    #[must_use]
    pub const fn token_expiry(&self) -> Duration {
        self.token_expiry
    }

    /// Issue a token for `user`
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        self.generate_token_at(user.id, Utc::now())
    }

    /// Issue a token as if the clock read `issued_at`
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails
    pub fn generate_token_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.token_expiry).timestamp(),
            aud: JWT_AUDIENCE.to_owned(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing why the token was rejected
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[JWT_AUDIENCE]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(token, &e, &self.decoding_key))
    }

    /// Validate a token and return the user it was issued to
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` or `AuthInvalid`
    pub fn user_id_from_token(&self, token: &str) -> AppResult<Uuid> {
        let claims = self.validate_token(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::auth_invalid("Token subject is not a user id"))
    }

    fn convert_jwt_error(
        token: &str,
        error: &JwtError,
        key: &DecodingKey,
    ) -> JwtValidationError {
        match error.kind() {
            ErrorKind::ExpiredSignature => {
                // Re-read the claims without the expiry check to report when it lapsed
                let mut relaxed = Validation::new(Algorithm::HS256);
                relaxed.validate_exp = false;
                relaxed.validate_aud = false;
                let expired_at = decode::<Claims>(token, key, &relaxed)
                    .ok()
                    .and_then(|data| DateTime::from_timestamp(data.claims.exp, 0))
                    .unwrap_or_else(Utc::now);
                JwtValidationError::TokenExpired { expired_at }
            }
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "signature verification failed".to_owned(),
            },
            ErrorKind::InvalidAudience => JwtValidationError::TokenInvalid {
                reason: "unexpected audience".to_owned(),
            },
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                JwtValidationError::TokenMalformed {
                    details: error.to_string(),
                }
            }
            _ => JwtValidationError::TokenInvalid {
                reason: error.to_string(),
            },
        }
    }
}

/// Authenticated caller, extracted from `Authorization: Bearer <jwt>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// Token subject
    pub user_id: Uuid,
}

impl AuthUser {
    /// Refuse access to another user's data
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when `owner` is not the caller
    pub fn ensure_owner(&self, owner: Uuid) -> AppResult<()> {
        if self.user_id == owner {
            Ok(())
        } else {
            AppLogger::log_security_event(
                "cross_user_access",
                &format!("attempted access to data of {owner}"),
                Some(&self.user_id.to_string()),
            );
            Err(AppError::permission_denied("Cannot access another user's data"))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<ServerResources>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        resources: &Arc<ServerResources>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(AppError::auth_required)?
            .to_str()
            .map_err(|_| AppError::auth_invalid("Authorization header is not valid text"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Expected a Bearer token"))?;

        let user_id = resources.auth_manager.user_id_from_token(token)?;
        debug!(user.id = %user_id, "Request authenticated");
        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_token_round_trip() {
        let manager = AuthManager::new(SECRET, 30);
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();
        let token = manager.generate_token_at(user_id, issued_at).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
        assert_eq!(manager.user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = AuthManager::new(SECRET, 30);
        let token = manager
            .generate_token_at(Uuid::new_v4(), Utc::now() - Duration::days(31))
            .unwrap();

        let error = manager.validate_token(&token).unwrap_err();
        assert!(matches!(error, JwtValidationError::TokenExpired { .. }));
        assert_eq!(AppError::from(error).code, ErrorCode::AuthExpired);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let issuer = AuthManager::new(b"another-secret-another-secret-xx", 30);
        let verifier = AuthManager::new(SECRET, 30);
        let token = issuer.generate_token_at(Uuid::new_v4(), Utc::now()).unwrap();

        let error = verifier.user_id_from_token(&token).unwrap_err();
        assert_eq!(error.code, ErrorCode::AuthInvalid);
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let manager = AuthManager::new(SECRET, 30);
        assert!(matches!(
            manager.validate_token("not.a.jwt").unwrap_err(),
            JwtValidationError::TokenMalformed { .. }
        ));
    }

    #[test]
    fn test_production_requires_secret() {
        let config = AuthConfig {
            jwt_secret: None,
            jwt_expiry_days: 30,
        };
        assert!(AuthManager::from_config(&config, Environment::Production).is_err());
        assert!(AuthManager::from_config(&config, Environment::Development).is_ok());
    }

    #[test]
    fn test_owner_check() {
        let caller = AuthUser {
            user_id: Uuid::new_v4(),
        };
        assert!(caller.ensure_owner(caller.user_id).is_ok());
        assert_eq!(
            caller.ensure_owner(Uuid::new_v4()).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
    }
}
