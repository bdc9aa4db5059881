// ABOUTME: Integration tests for SQLite storage of users, vitals, subscriptions and turns
// ABOUTME: Verifies uniqueness, newest-first ordering, filters and persistence across reconnects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{create_test_database, create_test_user, record_blood_pressure};
use companion_core::models::{
    AgentType, Category, NewHealthRecord, NewTurn, RecordType, SenderRole,
};
use companion_server::database::Database;
use companion_server::errors::ErrorCode;
use companion_server::services::subscriptions;
use uuid::Uuid;

fn turn(user_id: Uuid, message: &str, category: Category) -> NewTurn {
    NewTurn {
        user_id,
        agent_type: AgentType::SelfPersona,
        sender_role: SenderRole::User,
        message: message.to_owned(),
        category,
    }
}

#[tokio::test]
async fn test_phone_numbers_are_unique() {
    let database = create_test_database().await.unwrap();
    let user = create_test_user(&database, "김철수", (1985, 3, 15), "010-1234-5678")
        .await
        .unwrap();

    let duplicate = create_test_user(&database, "김영수", (1990, 1, 1), "010-1234-5678").await;
    assert!(duplicate.is_err());

    let found = database.get_user_by_phone("010-1234-5678").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.name, user.name);
    assert_eq!(found.birth_date, user.birth_date);
    assert!(database.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_health_records_newest_first_with_type_filter() {
    let database = create_test_database().await.unwrap();
    let user = create_test_user(&database, "김철수", (1985, 3, 15), "010-1234-5678")
        .await
        .unwrap();

    record_blood_pressure(&database, &user, 120, 80).await.unwrap();
    database
        .insert_health_record(
            user.id,
            &NewHealthRecord {
                blood_sugar: Some(110),
                ..NewHealthRecord::default()
            },
            RecordType::Checkup,
        )
        .await
        .unwrap();
    record_blood_pressure(&database, &user, 135, 88).await.unwrap();

    let all = database.list_health_records(user.id, None, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].blood_pressure(), Some((135, 88)));
    assert_eq!(all[1].record_type, RecordType::Checkup);

    let daily = database
        .list_health_records(user.id, Some(RecordType::Daily), 10)
        .await
        .unwrap();
    assert_eq!(daily.len(), 2);
    assert!(daily.iter().all(|r| r.record_type == RecordType::Daily));

    let latest = database.latest_health_record(user.id).await.unwrap().unwrap();
    assert_eq!(latest.blood_pressure_sys, Some(135));
}

#[tokio::test]
async fn test_records_for_unknown_user_are_rejected() {
    let database = create_test_database().await.unwrap();
    let error = database
        .insert_health_record(Uuid::new_v4(), &NewHealthRecord::default(), RecordType::Daily)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);

    let error = subscriptions::enroll(&database, Uuid::new_v4(), 100_000)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_profile_snapshot_uses_latest_state() {
    let database = create_test_database().await.unwrap();
    let user = create_test_user(&database, "김철수", (1985, 3, 15), "010-1234-5678")
        .await
        .unwrap();

    let empty = database.load_profile_snapshot(user.id).await.unwrap();
    assert!(empty.latest_health_record.is_none());
    assert!(empty.active_subscription.is_none());

    record_blood_pressure(&database, &user, 128, 82).await.unwrap();
    subscriptions::enroll(&database, user.id, 100_000).await.unwrap();
    let newest = subscriptions::enroll(&database, user.id, 300_000).await.unwrap();

    let snapshot = database.load_profile_snapshot(user.id).await.unwrap();
    assert_eq!(snapshot.user.name, "김철수");
    assert_eq!(
        snapshot.latest_health_record.unwrap().blood_pressure(),
        Some((128, 82))
    );
    assert_eq!(snapshot.active_subscription.unwrap().id, newest.id);
    assert_eq!(database.active_subscriptions(user.id).await.unwrap().len(), 2);

    let missing = database.load_profile_snapshot(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(missing.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_history_filter_and_limit() {
    let database = create_test_database().await.unwrap();
    let user = create_test_user(&database, "김철수", (1985, 3, 15), "010-1234-5678")
        .await
        .unwrap();

    database
        .append_turns(&[
            turn(user.id, "검진 결과", Category::HealthCheckup),
            turn(user.id, "산책", Category::DailyHealthCare),
            turn(user.id, "검진 예약", Category::HealthCheckup),
        ])
        .await
        .unwrap();

    let checkups = database
        .conversation_history(user.id, Some(Category::HealthCheckup), 100)
        .await
        .unwrap();
    let messages: Vec<&str> = checkups.iter().map(|t| t.message.as_str()).collect();
    assert_eq!(messages, ["검진 예약", "검진 결과"]);

    let limited = database.conversation_history(user.id, None, 2).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].message, "검진 예약");

    let recent = database
        .recent_turns(user.id, AgentType::SelfPersona, 1)
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].message, "검진 예약");
}

#[tokio::test]
async fn test_file_database_persists_across_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("companion.db").display());

    let user_id = {
        let database = Database::new(&url).await.unwrap();
        create_test_user(&database, "김철수", (1985, 3, 15), "010-1234-5678")
            .await
            .unwrap()
            .id
    };

    let reopened = Database::new(&url).await.unwrap();
    let user = reopened.get_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.phone, "010-1234-5678");
}
