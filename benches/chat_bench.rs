// ABOUTME: Criterion benchmarks for the per-message conversation pipeline
// ABOUTME: Measures keyword classification and context window assembly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the synchronous parts of a chat exchange.
//!
//! Classification runs twice per exchange and window assembly once, so both
//! sit on the request path ahead of the model call.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use chrono::{Duration, Utc};
use companion_core::models::{AgentType, Category, ConversationTurn, SenderRole};
use companion_server::chat::{build_context_window, classify};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

const SAMPLE_MESSAGES: [&str; 6] = [
    "건강검진 결과가 나왔어요",
    "이번 달 적립금은 얼마인가요?",
    "오늘 혈압이 조금 높았어요",
    "병원 예약을 하고 싶어요",
    "지난달 리포트 보여줘",
    "오늘 날씨가 참 좋네요",
];

/// Newest-first history of alternating user and agent turns
fn generate_history(count: usize) -> Vec<ConversationTurn> {
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    (0..count)
        .map(|i| ConversationTurn {
            id: Uuid::new_v4(),
            user_id,
            agent_type: AgentType::SelfPersona,
            sender_role: if i % 2 == 0 {
                SenderRole::Agent
            } else {
                SenderRole::User
            },
            message: SAMPLE_MESSAGES[i % SAMPLE_MESSAGES.len()].to_owned(),
            category: Category::DailyHealthCare,
            created_at: now - Duration::seconds(i64::try_from(i).unwrap()),
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    group.bench_function("keyword_hit", |b| {
        b.iter(|| classify(black_box("건강검진 결과가 나왔어요")));
    });

    // Falls through every rule to the default category
    group.bench_function("no_match", |b| {
        b.iter(|| classify(black_box("오늘 날씨가 참 좋네요")));
    });

    let long_message = SAMPLE_MESSAGES[5].repeat(50);
    group.bench_function("long_no_match", |b| {
        b.iter(|| classify(black_box(&long_message)));
    });

    group.finish();
}

fn bench_context_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("context_window");

    for history_len in [4_usize, 10, 50] {
        let history = generate_history(history_len);
        group.bench_with_input(
            BenchmarkId::from_parameter(history_len),
            &history,
            |b, history| {
                b.iter(|| build_context_window(black_box(history.clone()), 10));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_context_window);
criterion_main!(benches);
