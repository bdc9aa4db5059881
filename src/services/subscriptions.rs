// ABOUTME: Subscription enrollment and coverage projection
// ABOUTME: Derives coverage ratio and amount from the monthly contribution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use companion_core::models::{Subscription, SubscriptionStatus};
use tracing::info;
use uuid::Uuid;

use crate::constants::subscription::{ESTIMATED_MEDICAL_COST, RATIO_STEP_AMOUNT};
use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};

/// Fraction of the estimated medical cost a monthly contribution covers.
///
/// Every 100,000 won per month covers a tenth of the estimate.
#[must_use]
pub fn coverage_ratio(monthly_amount: i64) -> f64 {
    (monthly_amount as f64 / RATIO_STEP_AMOUNT) / 10.0
}

/// Projected coverage in won, rounded down
#[must_use]
pub fn coverage_amount(ratio: f64) -> i64 {
    (ESTIMATED_MEDICAL_COST as f64 * ratio).floor() as i64
}

/// Start a new active subscription
///
/// # Errors
///
/// Returns `ValueOutOfRange` for a non-positive amount, `ResourceNotFound`
/// for an unknown user, `DatabaseError` otherwise
pub async fn enroll(
    database: &Database,
    user_id: Uuid,
    monthly_amount: i64,
) -> AppResult<Subscription> {
    if monthly_amount <= 0 {
        return Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            "monthlyAmount must be a positive number of won",
        ));
    }

    let ratio = coverage_ratio(monthly_amount);
    let subscription = Subscription {
        id: Uuid::new_v4(),
        user_id,
        monthly_amount,
        coverage_amount: coverage_amount(ratio),
        coverage_ratio: ratio,
        status: SubscriptionStatus::Active,
        started_at: Utc::now(),
    };

    database.create_subscription(&subscription).await?;
    info!(
        user.id = %user_id,
        subscription.monthly_amount = monthly_amount,
        subscription.coverage_amount = subscription.coverage_amount,
        "Subscription started"
    );
    Ok(subscription)
}
