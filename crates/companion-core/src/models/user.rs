// ABOUTME: Registered user model
// ABOUTME: Identity, display name, birth date and phone number
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered person. Created at registration and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Display name, used by the persona to address the user
    pub name: String,
    /// Date of birth
    pub birth_date: NaiveDate,
    /// Phone number, unique across users
    pub phone: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new user with a fresh ID
    #[must_use]
    pub fn new(name: String, birth_date: NaiveDate, phone: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            birth_date,
            phone,
            created_at: Utc::now(),
        }
    }
}
