// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Conversation, profile, subscription and health-analysis constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants grouped by the domain that owns them.

/// Conversation pipeline limits
pub mod chat {
    /// Number of prior turns handed to the model
    pub const DEFAULT_CONTEXT_WINDOW: usize = 20;
    /// Completion cap requested from the model
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;
    /// Turns returned by the history endpoint
    pub const HISTORY_LIMIT: i64 = 100;
    /// Overall model step budget in seconds
    pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
    /// Retries after the first model attempt
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    /// First backoff step in milliseconds
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 250;
    /// Backoff ceiling in milliseconds
    pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 4000;
    /// Offset of the users' calendar from UTC in minutes (KST)
    pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 540;
}

/// Profile summary formatting
pub mod profile {
    /// Shown when no blood pressure reading is available
    pub const NO_BLOOD_PRESSURE: &str = "정보 없음";
    /// Shown when the user has no active subscription
    pub const NO_SUBSCRIPTION: &str = "적립 없음";
    /// Display unit for currency amounts (만원)
    pub const CURRENCY_DISPLAY_UNIT: f64 = 10_000.0;
}

/// Subscription coverage arithmetic
pub mod subscription {
    /// Estimated lifetime medical cost used for coverage projection
    pub const ESTIMATED_MEDICAL_COST: i64 = 28_000_000;
    /// Monthly contribution that yields a 10% coverage ratio
    pub const RATIO_STEP_AMOUNT: f64 = 100_000.0;
}

/// Blood pressure analysis thresholds
pub mod health {
    /// Records considered by the analysis endpoint
    pub const ANALYSIS_RECORD_LIMIT: i64 = 30;
    /// Default page size for record listing
    pub const DEFAULT_RECORD_LIMIT: i64 = 30;
    /// Average systolic at or above this is high
    pub const SYSTOLIC_HIGH: f64 = 140.0;
    /// Average systolic at or above this is elevated
    pub const SYSTOLIC_ELEVATED: f64 = 120.0;
    /// Records needed before a trend is reported
    pub const TREND_MIN_RECORDS: usize = 14;
    /// Size of each comparison window
    pub const TREND_WINDOW: usize = 7;
    /// Mean difference that counts as a change
    pub const TREND_THRESHOLD: f64 = 5.0;
    /// Advice attached to a high reading
    pub const HIGH_BP_RECOMMENDATION: &str = "혈압이 높습니다. AI 닥터 상담을 권장합니다.";
}

/// Real-time channel naming
pub mod realtime {
    /// Prefix of the per-user notification room
    pub const USER_ROOM_PREFIX: &str = "user_";
}
