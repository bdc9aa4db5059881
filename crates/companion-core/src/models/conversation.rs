// ABOUTME: Conversation turn records and the closed topic category set
// ABOUTME: Turns are append-only; categories are computed per message from text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Which persona a turn belongs to. History is partitioned by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    /// The user's future self, the everyday companion persona
    #[serde(rename = "self")]
    SelfPersona,
    /// The clinical persona that medical questions are deferred to
    #[serde(rename = "doctor")]
    Doctor,
}

impl AgentType {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfPersona => "self",
            Self::Doctor => "doctor",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" => Ok(Self::SelfPersona),
            "doctor" => Ok(Self::Doctor),
            other => Err(AppError::invalid_input(format!("Unknown agent type: {other}"))),
        }
    }
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The human user
    User,
    /// The model speaking as the persona
    Agent,
}

impl SenderRole {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            other => Err(AppError::invalid_input(format!("Unknown sender role: {other}"))),
        }
    }
}

/// Topic bucket assigned to every message
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Checkup results and their analysis
    HealthCheckup,
    /// Contributions and coverage
    SubscriptionManagement,
    /// Everyday vitals, medication and exercise
    #[default]
    DailyHealthCare,
    /// Hospitals, doctors and prescriptions
    ClinicalCare,
    /// Periodic summaries
    Report,
}

impl Category {
    /// Every category in priority order
    pub const ALL: [Self; 5] = [
        Self::HealthCheckup,
        Self::SubscriptionManagement,
        Self::DailyHealthCare,
        Self::ClinicalCare,
        Self::Report,
    ];

    /// Slug used on the wire and in storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HealthCheckup => "health-checkup",
            Self::SubscriptionManagement => "subscription-management",
            Self::DailyHealthCare => "daily-health-care",
            Self::ClinicalCare => "clinical-care",
            Self::Report => "report",
        }
    }

    /// Label shown in the mobile client
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::HealthCheckup => "건강 검진",
            Self::SubscriptionManagement => "적립 관리",
            Self::DailyHealthCare => "일상 건강 관리",
            Self::ClinicalCare => "병원 & 진료",
            Self::Report => "리포트",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown category: {s}")))
    }
}

/// One persisted message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    /// Unique turn ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Persona partition
    pub agent_type: AgentType,
    /// Who produced the text
    pub sender_role: SenderRole,
    /// Message text
    pub message: String,
    /// Assigned topic
    pub category: Category,
    /// Commit time
    pub created_at: DateTime<Utc>,
}

/// A turn waiting to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTurn {
    /// Owning user
    pub user_id: Uuid,
    /// Persona partition
    pub agent_type: AgentType,
    /// Who produced the text
    pub sender_role: SenderRole,
    /// Message text
    pub message: String,
    /// Assigned topic
    pub category: Category,
}
