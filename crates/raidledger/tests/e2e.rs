// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over a real temp database.
//!
//! Each test builds an isolated TestHarness. Tests are independent and
//! order-insensitive.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt;

use raidledger_core::{QuotaActionType, QuotaRoleConfigPatch, RoleMemberStats, StorageAdapter};
use raidledger_gateway::{AuthConfig, GatewayState, router};
use raidledger_quota::QuotaEventInput;
use raidledger_test_utils::{GUILD_ID, TestHarness};

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ---- Ledger idempotency ----

#[tokio::test]
async fn test_duplicate_completion_stores_one_row() {
    let harness = TestHarness::builder().build().await.unwrap();

    let first = harness.seed_completion("200", "run:7", "fungal", 3).await.unwrap();
    let second = harness.seed_completion("200", "run:7", "fungal", 3).await.unwrap();
    assert!(first.is_some());
    assert!(second.is_none());

    let events = harness.quota.user_events(GUILD_ID, "200", 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(harness.quota.is_run_already_logged(GUILD_ID, 7).await.unwrap());
}

// ---- Points resolution ----

#[tokio::test]
async fn test_highest_override_wins_and_defaults_apply() {
    let harness = TestHarness::builder().build().await.unwrap();
    let quota = &harness.quota;

    assert_eq!(quota.points_for_dungeon(GUILD_ID, "fungal", None).await.unwrap(), 1);
    assert_eq!(
        quota.key_pop_points_for_dungeon(GUILD_ID, "fungal").await.unwrap(),
        5
    );

    quota.set_dungeon_override(GUILD_ID, "50", "fungal", 3).await.unwrap();
    quota.set_dungeon_override(GUILD_ID, "51", "fungal", 5).await.unwrap();
    let roles = ids(&["50", "51"]);
    assert_eq!(
        quota.points_for_dungeon(GUILD_ID, "fungal", Some(&roles)).await.unwrap(),
        5
    );
    assert_eq!(quota.points_for_dungeon(GUILD_ID, "fungal", None).await.unwrap(), 5);
}

// ---- Period boundaries ----

#[tokio::test]
async fn test_period_follows_reset_position() {
    let harness = TestHarness::builder().build().await.unwrap();
    let now = Utc::now();

    let created = now - Duration::days(2);
    let future_reset = now + Duration::days(5);
    harness
        .quota
        .upsert_quota_role_config(
            GUILD_ID,
            "50",
            QuotaRoleConfigPatch {
                required_points: Some(10),
                created_at: Some(created),
                reset_at: Some(future_reset),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let period = harness.quota.quota_period(GUILD_ID, "50").await.unwrap().unwrap();
    assert_eq!(period.start.timestamp_millis(), created.timestamp_millis());
    assert_eq!(period.end.timestamp_millis(), future_reset.timestamp_millis());

    let past_reset = now - Duration::days(1);
    harness
        .quota
        .upsert_quota_role_config(
            GUILD_ID,
            "50",
            QuotaRoleConfigPatch {
                reset_at: Some(past_reset),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let period = harness.quota.quota_period(GUILD_ID, "50").await.unwrap().unwrap();
    assert_eq!(period.start.timestamp_millis(), past_reset.timestamp_millis());
    assert!(period.end >= now);
}

// ---- Raider award ----

#[tokio::test]
async fn test_zero_raider_points_skips_award() {
    let harness = TestHarness::builder().build().await.unwrap();
    let run = harness.seed_run("200", "fungal", &["301", "302"]).await.unwrap();
    harness.quota.set_raider_points(GUILD_ID, "fungal", 0).await.unwrap();

    let credit = harness
        .quota
        .credit_run_completion(GUILD_ID, run.id, &[])
        .await
        .unwrap();
    assert_eq!(credit.raiders_credited, 0);
    assert!(credit.organizer.is_some());
    for raider in ["301", "302"] {
        let events = harness.quota.user_events(GUILD_ID, raider, 10).await.unwrap();
        assert!(events.is_empty(), "raider {raider} should have no rows");
    }
}

#[tokio::test]
async fn test_completion_credits_everyone_once() {
    let harness = TestHarness::builder().build().await.unwrap();
    let run = harness
        .seed_run("200", "fungal", &["301", "302", "303"])
        .await
        .unwrap();
    harness.quota.set_raider_points(GUILD_ID, "fungal", 2).await.unwrap();

    let first = harness
        .quota
        .credit_run_completion(GUILD_ID, run.id, &ids(&["50"]))
        .await
        .unwrap();
    assert_eq!(first.raiders_credited, 3);
    assert_eq!(first.organizer.map(|e| e.quota_points), Some(1));

    let again = harness
        .quota
        .credit_run_completion(GUILD_ID, run.id, &ids(&["50"]))
        .await
        .unwrap();
    assert_eq!(again.raiders_credited, 0);
    assert!(again.organizer.is_none());

    let stats = harness.quota.user_quota_stats(GUILD_ID, "302").await.unwrap();
    assert_eq!(stats.total_points, 2);
    assert_eq!(stats.dungeons.len(), 1);
    assert_eq!(stats.dungeons[0].completed, 1);
}

// ---- Reporting ----

#[tokio::test]
async fn test_leaderboard_ties_break_on_runs() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.seed_completion("100", "run:1", "fungal", 5).await.unwrap();
    harness.seed_completion("100", "run:2", "fungal", 5).await.unwrap();
    for i in 0..5 {
        harness
            .seed_completion("200", &format!("run:{}", 10 + i), "fungal", 2)
            .await
            .unwrap();
    }

    let now = Utc::now();
    let board = harness
        .quota
        .quota_leaderboard(
            GUILD_ID,
            "50",
            &ids(&["100", "200"]),
            now - Duration::hours(1),
            now + Duration::hours(1),
        )
        .await
        .unwrap();
    let ranked: Vec<(&str, i64, i64)> = board
        .iter()
        .map(|e| (e.user_id.as_str(), e.points, e.runs))
        .collect();
    assert_eq!(ranked, vec![("200", 10, 5), ("100", 10, 2)]);

    let stats = harness
        .quota
        .quota_stats_for_role(
            GUILD_ID,
            &ids(&["100", "999"]),
            now - Duration::hours(1),
            now + Duration::hours(1),
        )
        .await
        .unwrap();
    assert_eq!(stats["100"], RoleMemberStats { points: 10, runs: 2 });
    assert_eq!(stats["999"], RoleMemberStats::default());
}

#[tokio::test]
async fn test_stats_round_trip_with_verification_and_key_pop() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.seed_completion("200", "run:1", "fungal", 3).await.unwrap();
    harness
        .quota
        .log_quota_event(
            GUILD_ID,
            QuotaEventInput {
                actor_user_id: "200".to_string(),
                action_type: QuotaActionType::VerifyMember,
                subject_id: Some("verify:555".to_string()),
                dungeon_key: None,
                quota_points: None,
            },
        )
        .await
        .unwrap();
    let pop = harness
        .quota
        .record_key_pop(GUILD_ID, "200", "shatters", None)
        .await
        .unwrap();
    assert_eq!(pop.count, 1);
    assert_eq!(pop.points, 5);

    let stats = harness.quota.user_quota_stats(GUILD_ID, "200").await.unwrap();
    assert_eq!(stats.total_quota_points, 4);
    assert_eq!(stats.total_runs_organized, 1);
    assert_eq!(stats.total_verifications, 1);
    assert_eq!(stats.total_keys_popped, 1);
    assert_eq!(stats.total_points, 5);
    let keys: Vec<&str> = stats.dungeons.iter().map(|d| d.dungeon_key.as_str()).collect();
    assert_eq!(keys, vec!["fungal", "shatters"]);
}

// ---- Gateway and storage lifecycle ----

#[tokio::test]
async fn test_gateway_serves_stats_from_shared_database() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.seed_completion("200", "run:1", "fungal", 3).await.unwrap();

    let app = router(GatewayState {
        quota: harness.quota.clone(),
        storage: harness.storage.clone(),
        auth: AuthConfig {
            bearer_token: Some("e2e".to_string()),
        },
    });
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/guilds/{GUILD_ID}/quota/users/200/stats"))
                .header("authorization", "Bearer e2e")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total_quota_points"], 3);
}

#[tokio::test]
async fn test_storage_closes_cleanly() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.seed_completion("200", "run:1", "fungal", 1).await.unwrap();
    harness.storage.close().await.unwrap();
}
