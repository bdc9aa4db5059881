// ABOUTME: Keyword-based topic classification for chat messages
// ABOUTME: Ordered rule table where the first category with a matching keyword wins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use companion_core::models::Category;

/// Rules evaluated top to bottom. Order encodes priority.
pub const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (Category::HealthCheckup, &["검진", "건강검진", "결과", "분석"]),
    (
        Category::SubscriptionManagement,
        &["적립", "보장", "만원", "금액", "구독"],
    ),
    (
        Category::DailyHealthCare,
        &["혈압", "혈당", "약", "운동", "산책", "걸음"],
    ),
    (
        Category::ClinicalCare,
        &["병원", "의사", "진료", "처방", "닥터"],
    ),
    (Category::Report, &["리포트", "요약", "월간", "분기"]),
];

/// Assign a topic to message text.
///
/// Substring match, case-sensitive. Falls back to
/// [`Category::DailyHealthCare`] when nothing matches, including for empty text.
#[must_use]
pub fn classify(text: &str) -> Category {
    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map_or_else(Category::default, |(category, _)| *category)
}
