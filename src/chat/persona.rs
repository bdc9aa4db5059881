// ABOUTME: Persona prompt builder with a validated placeholder template
// ABOUTME: Renders profile fields into the system prompt in a single pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Persona Prompt Builder
//!
//! A [`PromptTemplate`] is static configuration: template text plus the fixed
//! set of named placeholders. Construction checks that every placeholder
//! occurs exactly once and records where; rendering splices values into those
//! positions without re-scanning them, so user-controlled text such as a name
//! containing `{userAge}` is inserted literally.

use std::fs;
use std::path::Path;

use tracing::info;

use super::profile::ProfileSummary;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::SELF_PERSONA_PROMPT;

/// A named slot in the persona template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Display name
    UserName,
    /// Whole years of age
    UserAge,
    /// Latest blood pressure or sentinel
    RecentBloodPressure,
    /// Subscription summary or sentinel
    SubscriptionInfo,
}

impl Placeholder {
    /// Every placeholder a template must contain
    pub const ALL: [Self; 4] = [
        Self::UserName,
        Self::UserAge,
        Self::RecentBloodPressure,
        Self::SubscriptionInfo,
    ];

    /// Token as written in template text
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::UserName => "{userName}",
            Self::UserAge => "{userAge}",
            Self::RecentBloodPressure => "{recentBloodPressure}",
            Self::SubscriptionInfo => "{subscriptionInfo}",
        }
    }

    fn value(self, summary: &ProfileSummary) -> String {
        match self {
            Self::UserName => summary.name.clone(),
            Self::UserAge => summary.age.to_string(),
            Self::RecentBloodPressure => summary.recent_blood_pressure.clone(),
            Self::SubscriptionInfo => summary.subscription_info.clone(),
        }
    }
}

/// Validated persona template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    /// Placeholder byte offsets, ascending
    slots: Vec<(usize, Placeholder)>,
}

impl PromptTemplate {
    /// Parse and validate template text
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if any placeholder is missing or repeated
    pub fn new(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        let mut slots = Vec::with_capacity(Placeholder::ALL.len());

        for placeholder in Placeholder::ALL {
            let token = placeholder.token();
            let positions: Vec<usize> = text.match_indices(token).map(|(i, _)| i).collect();
            match positions.as_slice() {
                [position] => slots.push((*position, placeholder)),
                [] => {
                    return Err(AppError::config_invalid(format!(
                        "Persona template is missing placeholder {token}"
                    )))
                }
                _ => {
                    return Err(AppError::config_invalid(format!(
                        "Persona template repeats placeholder {token} {} times",
                        positions.len()
                    )))
                }
            }
        }

        slots.sort_unstable_by_key(|(position, _)| *position);
        Ok(Self { text, slots })
    }

    /// The compiled-in future-self persona
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if the bundled template is malformed
    pub fn builtin() -> AppResult<Self> {
        Self::new(SELF_PERSONA_PROMPT)
    }

    /// Load an alternative template (locale or tone variant) from disk
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or is invalid
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!(
                "Failed to read persona template {}: {e}",
                path.display()
            ))
        })?;
        let template = Self::new(text)?;
        info!("Loaded persona template from {}", path.display());
        Ok(template)
    }

    /// Use `path` when given, the built-in template otherwise
    ///
    /// # Errors
    ///
    /// Propagates load or validation failures
    pub fn from_optional_path(path: Option<&Path>) -> AppResult<Self> {
        path.map_or_else(Self::builtin, Self::from_file)
    }

    /// Raw template text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill every placeholder exactly once
    #[must_use]
    pub fn render(&self, summary: &ProfileSummary) -> String {
        let mut output = String::with_capacity(self.text.len() + 128);
        let mut cursor = 0;

        for (position, placeholder) in &self.slots {
            output.push_str(&self.text[cursor..*position]);
            output.push_str(&placeholder.value(summary));
            cursor = position + placeholder.token().len();
        }
        output.push_str(&self.text[cursor..]);

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn summary() -> ProfileSummary {
        ProfileSummary {
            name: "김철수".to_owned(),
            age: 60,
            recent_blood_pressure: "정보 없음".to_owned(),
            subscription_info: "적립 없음".to_owned(),
        }
    }

    #[test]
    fn test_builtin_template_is_valid() {
        let template = PromptTemplate::builtin().unwrap();
        assert!(template.text().contains("미래 자아"));
    }

    #[test]
    fn test_render_leaves_no_placeholders() {
        let rendered = PromptTemplate::builtin().unwrap().render(&summary());
        for placeholder in Placeholder::ALL {
            assert!(!rendered.contains(placeholder.token()));
        }
        assert!(rendered.contains("- 이름: 김철수"));
        assert!(rendered.contains("- 나이: 60세"));
        assert!(rendered.contains("- 최근 혈압: 정보 없음"));
        assert!(rendered.contains("- 적립 현황: 적립 없음"));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut tricky = summary();
        tricky.name = "{userAge}".to_owned();
        let rendered = PromptTemplate::builtin().unwrap().render(&tricky);
        assert!(rendered.contains("- 이름: {userAge}"));
        assert!(rendered.contains("- 나이: 60세"));
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let error = PromptTemplate::new("Hi {userName}, age {userAge}, bp {recentBloodPressure}")
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::ConfigInvalid);
        assert!(error.message.contains("{subscriptionInfo}"));
    }

    #[test]
    fn test_repeated_placeholder_rejected() {
        let text = "{userName} {userName} {userAge} {recentBloodPressure} {subscriptionInfo}";
        assert!(PromptTemplate::new(text).is_err());
    }

    #[test]
    fn test_custom_template_order_independent() {
        let template = PromptTemplate::new(
            "{subscriptionInfo}|{recentBloodPressure}|{userAge}|{userName}",
        )
        .unwrap();
        assert_eq!(template.render(&summary()), "적립 없음|정보 없음|60|김철수");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.md");
        fs::write(
            &path,
            "You are {userName} ({userAge}). BP {recentBloodPressure}. {subscriptionInfo}",
        )
        .unwrap();

        let template = PromptTemplate::from_optional_path(Some(&path)).unwrap();
        assert_eq!(
            template.render(&summary()),
            "You are 김철수 (60). BP 정보 없음. 적립 없음"
        );

        let missing = dir.path().join("absent.md");
        assert!(PromptTemplate::from_file(&missing).is_err());
    }
}
