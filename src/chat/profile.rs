// ABOUTME: Profile summarizer turning raw user state into persona prompt fields
// ABOUTME: Computes age and formats recent vitals and subscription figures with sentinels
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use companion_core::models::{HealthRecord, Subscription, User};

use crate::constants::profile::{CURRENCY_DISPLAY_UNIT, NO_BLOOD_PRESSURE, NO_SUBSCRIPTION};

/// Everything the persona needs to know about a user, loaded in one read
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    /// The user
    pub user: User,
    /// Most recent measurement, if any
    pub latest_health_record: Option<HealthRecord>,
    /// Most recently started active subscription, if any
    pub active_subscription: Option<Subscription>,
}

/// Display-ready profile fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    /// Display name
    pub name: String,
    /// Whole years of age
    pub age: i32,
    /// `"sys/dia"` or the no-data sentinel
    pub recent_blood_pressure: String,
    /// Contribution summary or the no-subscription sentinel
    pub subscription_info: String,
}

/// Calendar date at `now` for users living at `offset` from UTC
#[must_use]
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Whole years elapsed between `birth_date` and `today`.
///
/// One year is subtracted while `today`'s month/day precedes the birth
/// month/day. A Feb 29 birthday therefore ticks over on Mar 1 in common years.
#[must_use]
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years - 1
    } else {
        years
    }
}

/// `"sys/dia"` when the record carries both values
#[must_use]
pub fn format_blood_pressure(record: Option<&HealthRecord>) -> String {
    record
        .and_then(HealthRecord::blood_pressure)
        .map_or_else(
            || NO_BLOOD_PRESSURE.to_owned(),
            |(sys, dia)| format!("{sys}/{dia}"),
        )
}

/// Amounts shown in units of 10,000 won, rounded to the nearest unit
#[must_use]
pub fn format_subscription(subscription: Option<&Subscription>) -> String {
    subscription
        .filter(|s| s.is_active())
        .map_or_else(
            || NO_SUBSCRIPTION.to_owned(),
            |s| {
                format!(
                    "월 {}만원 적립 중, {}만원 보장",
                    in_display_units(s.monthly_amount),
                    in_display_units(s.coverage_amount)
                )
            },
        )
}

fn in_display_units(amount: i64) -> i64 {
    (amount as f64 / CURRENCY_DISPLAY_UNIT).round() as i64
}

/// Summarize a profile as of `today`
#[must_use]
pub fn summarize(snapshot: &ProfileSnapshot, today: NaiveDate) -> ProfileSummary {
    ProfileSummary {
        name: snapshot.user.name.clone(),
        age: age_on(snapshot.user.birth_date, today),
        recent_blood_pressure: format_blood_pressure(snapshot.latest_health_record.as_ref()),
        subscription_info: format_subscription(snapshot.active_subscription.as_ref()),
    }
}
