// ABOUTME: Health risk analysis over recent daily measurements
// ABOUTME: Classifies average systolic pressure and the week-over-week trend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use companion_core::models::{HealthRecord, RecordType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::health::{
    ANALYSIS_RECORD_LIMIT, HIGH_BP_RECOMMENDATION, SYSTOLIC_ELEVATED, SYSTOLIC_HIGH,
    TREND_MIN_RECORDS, TREND_THRESHOLD, TREND_WINDOW,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};

/// Blood pressure band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureStatus {
    /// No systolic readings
    Unknown,
    /// Average below the elevated threshold
    Normal,
    /// Average at or above 120
    Elevated,
    /// Average at or above 140
    High,
}

/// Average systolic pressure with its band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureAssessment {
    /// Band
    pub status: PressureStatus,
    /// Mean systolic over readings that carry one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

/// Direction of systolic pressure between the last two weeks of readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Fewer than 14 records
    InsufficientData,
    /// Recent week more than 5 above the week before
    Increasing,
    /// Recent week more than 5 below the week before
    Decreasing,
    /// Within 5 either way
    Stable,
}

/// Analysis payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysis {
    /// Pressure band
    pub blood_pressure: PressureAssessment,
    /// Week-over-week direction
    pub trend: Trend,
    /// Advice strings
    pub recommendations: Vec<String>,
}

/// Band the mean systolic pressure of `records`.
///
/// Records without a systolic value still count toward the divisor, the
/// same as in [`assess_trend`].
#[must_use]
pub fn assess_blood_pressure(records: &[HealthRecord]) -> PressureAssessment {
    if records.is_empty() {
        return PressureAssessment {
            status: PressureStatus::Unknown,
            average: None,
        };
    }

    let total: f64 = records
        .iter()
        .filter_map(|r| r.blood_pressure_sys)
        .map(f64::from)
        .sum();
    let average = total / records.len() as f64;
    let status = if average >= SYSTOLIC_HIGH {
        PressureStatus::High
    } else if average >= SYSTOLIC_ELEVATED {
        PressureStatus::Elevated
    } else {
        PressureStatus::Normal
    };

    PressureAssessment {
        status,
        average: Some(average),
    }
}

/// Compare the newest week of records against the week before.
///
/// `records` must be newest first. Missing systolic values count as zero.
#[must_use]
pub fn assess_trend(records: &[HealthRecord]) -> Trend {
    if records.len() < TREND_MIN_RECORDS {
        return Trend::InsufficientData;
    }

    let window_mean = |window: &[HealthRecord]| {
        window
            .iter()
            .map(|r| f64::from(r.blood_pressure_sys.unwrap_or(0)))
            .sum::<f64>()
            / TREND_WINDOW as f64
    };

    let recent = window_mean(&records[..TREND_WINDOW]);
    let previous = window_mean(&records[TREND_WINDOW..TREND_WINDOW * 2]);

    if recent > previous + TREND_THRESHOLD {
        Trend::Increasing
    } else if recent < previous - TREND_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Full analysis of newest-first records
#[must_use]
pub fn analyze(records: &[HealthRecord]) -> HealthAnalysis {
    let blood_pressure = assess_blood_pressure(records);
    let mut recommendations = Vec::new();
    if blood_pressure.status == PressureStatus::High {
        recommendations.push(HIGH_BP_RECOMMENDATION.to_owned());
    }

    HealthAnalysis {
        blood_pressure,
        trend: assess_trend(records),
        recommendations,
    }
}

/// Analyze a user's latest daily records
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown user, `DatabaseError` otherwise
pub async fn analyze_user(database: &Database, user_id: Uuid) -> AppResult<HealthAnalysis> {
    if database.get_user(user_id).await?.is_none() {
        return Err(AppError::not_found("User"));
    }
    let records = database
        .list_health_records(user_id, Some(RecordType::Daily), ANALYSIS_RECORD_LIMIT)
        .await?;
    Ok(analyze(&records))
}
