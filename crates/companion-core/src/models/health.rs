// ABOUTME: Health measurement records owned by a user
// ABOUTME: Blood pressure, blood sugar and weight snapshots with a record type tag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Kind of measurement snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Self-reported daily measurement
    Daily,
    /// Result imported from a medical checkup
    Checkup,
}

impl RecordType {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Checkup => "checkup",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "checkup" => Ok(Self::Checkup),
            other => Err(AppError::invalid_input(format!(
                "Unknown record type: {other}"
            ))),
        }
    }
}

/// One measurement snapshot. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Systolic pressure (mmHg)
    pub blood_pressure_sys: Option<i32>,
    /// Diastolic pressure (mmHg)
    pub blood_pressure_dia: Option<i32>,
    /// Blood sugar (mg/dL)
    pub blood_sugar: Option<i32>,
    /// Body weight (kg)
    pub weight: Option<f64>,
    /// Record type tag
    pub record_type: RecordType,
    /// Measurement time
    pub recorded_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Both pressure values, when the snapshot carries them
    #[must_use]
    pub const fn blood_pressure(&self) -> Option<(i32, i32)> {
        match (self.blood_pressure_sys, self.blood_pressure_dia) {
            (Some(sys), Some(dia)) => Some((sys, dia)),
            _ => None,
        }
    }
}

/// Fields supplied when recording a measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHealthRecord {
    /// Systolic pressure (mmHg)
    pub blood_pressure_sys: Option<i32>,
    /// Diastolic pressure (mmHg)
    pub blood_pressure_dia: Option<i32>,
    /// Blood sugar (mg/dL)
    pub blood_sugar: Option<i32>,
    /// Body weight (kg)
    pub weight: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sys: Option<i32>, dia: Option<i32>) -> HealthRecord {
        HealthRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            blood_pressure_sys: sys,
            blood_pressure_dia: dia,
            blood_sugar: None,
            weight: None,
            record_type: RecordType::Daily,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_blood_pressure_requires_both_values() {
        assert_eq!(record(Some(120), Some(80)).blood_pressure(), Some((120, 80)));
        assert_eq!(record(Some(120), None).blood_pressure(), None);
        assert_eq!(record(None, Some(80)).blood_pressure(), None);
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!("daily".parse::<RecordType>().unwrap(), RecordType::Daily);
        assert!("weekly".parse::<RecordType>().is_err());
    }
}
