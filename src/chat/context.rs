// ABOUTME: Context window assembly from stored conversation turns
// ABOUTME: Bounds, reorders and role-maps recent turns into model chat messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use companion_core::models::{AgentType, ConversationTurn, SenderRole};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::AppResult;
use crate::llm::ChatMessage;

/// Turn a newest-first slice of history into a chronological message list.
///
/// At most `window` of the newest turns are kept. Anything not sent by the
/// user is presented to the model as the assistant.
#[must_use]
pub fn build_context_window(mut newest_first: Vec<ConversationTurn>, window: usize) -> Vec<ChatMessage> {
    newest_first.truncate(window);
    newest_first
        .into_iter()
        .rev()
        .map(|turn| match turn.sender_role {
            SenderRole::User => ChatMessage::user(turn.message),
            SenderRole::Agent => ChatMessage::assistant(turn.message),
        })
        .collect()
}

/// Load and assemble the context window for one persona
///
/// # Errors
///
/// Returns `DatabaseError` if history cannot be read
pub async fn assemble_context(
    database: &Database,
    user_id: Uuid,
    agent_type: AgentType,
    window: usize,
) -> AppResult<Vec<ChatMessage>> {
    if window == 0 {
        return Ok(Vec::new());
    }
    let turns = database.recent_turns(user_id, agent_type, window).await?;
    Ok(build_context_window(turns, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;
    use chrono::{Duration, Utc};
    use companion_core::models::Category;

    fn turns_newest_first(count: usize) -> Vec<ConversationTurn> {
        let user_id = Uuid::new_v4();
        let start = Utc::now();
        (0..count)
            .rev()
            .map(|i| ConversationTurn {
                id: Uuid::new_v4(),
                user_id,
                agent_type: AgentType::SelfPersona,
                sender_role: if i % 2 == 0 { SenderRole::User } else { SenderRole::Agent },
                message: format!("turn {i}"),
                category: Category::DailyHealthCare,
                created_at: start + Duration::seconds(i64::try_from(i).unwrap()),
            })
            .collect()
    }

    #[test]
    fn test_window_is_chronological() {
        let messages = build_context_window(turns_newest_first(4), 20);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["turn 0", "turn 1", "turn 2", "turn 3"]);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[test]
    fn test_window_keeps_newest_turns() {
        let messages = build_context_window(turns_newest_first(25), 20);
        assert_eq!(messages.len(), 20);
        assert_eq!(messages.first().unwrap().content, "turn 5");
        assert_eq!(messages.last().unwrap().content, "turn 24");
    }

    #[test]
    fn test_empty_history_and_zero_window() {
        assert!(build_context_window(Vec::new(), 20).is_empty());
        assert!(build_context_window(turns_newest_first(3), 0).is_empty());
    }
}
