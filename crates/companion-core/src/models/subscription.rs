// ABOUTME: Subscription model for monthly contributions and projected coverage
// ABOUTME: Status is active on enrollment; deactivation happens outside this server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Enrollment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Contributions are being collected
    Active,
    /// Enrollment ended
    Inactive,
}

impl SubscriptionStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(AppError::invalid_input(format!(
                "Unknown subscription status: {other}"
            ))),
        }
    }
}

/// Recurring monthly contribution with its derived coverage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Unique subscription ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Monthly contribution in won
    pub monthly_amount: i64,
    /// Projected coverage in won
    pub coverage_amount: i64,
    /// Fraction of the estimated medical cost covered
    pub coverage_ratio: f64,
    /// Enrollment status
    pub status: SubscriptionStatus,
    /// Enrollment time
    pub started_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether contributions are still being collected
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}
