//! PostgreSQL store tests
//!
//! Run against a disposable database:
//!
//! ```text
//! CHARGEPULSE_POSTGRES_URL=postgres://... cargo test --test postgres_store -- --ignored
//! ```
//!
//! Every test creates its own station and reporters, so runs can share a database.

use chargepulse::models::NewVote;
use chargepulse::reputation::ReputationAward;
use chargepulse::{DatabasePool, VerificationStore, VoteValue};
use chrono::{Duration, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

/// Pool plus store with the schema in place, `None` when no database is configured
async fn connect() -> Option<(PgPool, DatabasePool)> {
    let url = std::env::var("CHARGEPULSE_POSTGRES_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .unwrap();
    let store = DatabasePool::from_pool(pool.clone());
    store.init_schema().await.unwrap();
    Some((pool, store))
}

async fn insert_station(pool: &PgPool) -> i64 {
    sqlx::query("INSERT INTO pulse.stations (name) VALUES ('test station') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
        .get("id")
}

async fn insert_reporter(pool: &PgPool, score: i64) -> i64 {
    sqlx::query(
        "INSERT INTO pulse.reporters (display_name, reputation_score) VALUES ($1, $2) RETURNING id",
    )
    .bind("test reporter")
    .bind(score)
    .fetch_one(pool)
    .await
    .unwrap()
    .get("id")
}

async fn score(store: &DatabasePool, reporter_id: i64) -> i64 {
    store
        .get_reporter(reporter_id)
        .await
        .unwrap()
        .unwrap()
        .reputation_score
}

// ============================================================================
// Ledger
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires CHARGEPULSE_POSTGRES_URL"]
async fn test_concurrent_awards_apply_once() {
    let Some((pool, store)) = connect().await else {
        return;
    };
    let station_id = insert_station(&pool).await;
    let reporter_id = insert_reporter(&pool, 0).await;
    let store = Arc::new(store);
    let window = Duration::minutes(30);
    let award = ReputationAward::verification_reward(reporter_id, station_id, 1, window);
    let now = Utc::now();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let award = award.clone();
        handles.push(tokio::spawn(async move {
            store.apply_award(&award, now).await.unwrap()
        }));
    }
    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(score(&store, reporter_id).await, 1);
    let events = store.reputation_events(reporter_id, usize::MAX).await.unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
#[ignore = "requires CHARGEPULSE_POSTGRES_URL"]
async fn test_unscoped_penalty_deduplicates() {
    let Some((pool, store)) = connect().await else {
        return;
    };
    let reporter_id = insert_reporter(&pool, 6).await;
    let penalty = ReputationAward::contradiction_penalty(reporter_id, -5, Duration::hours(24));
    let now = Utc::now();

    assert!(store.apply_award(&penalty, now).await.unwrap());
    assert!(!store.apply_award(&penalty, now + Duration::hours(1)).await.unwrap());
    assert_eq!(score(&store, reporter_id).await, 1);

    // Outside the window the same key applies again, clamped at zero
    assert!(store.apply_award(&penalty, now + Duration::hours(25)).await.unwrap());
    assert_eq!(score(&store, reporter_id).await, 0);
}

#[tokio::test]
#[ignore = "requires CHARGEPULSE_POSTGRES_URL"]
async fn test_report_reward_is_scoped_by_reason() {
    let Some((pool, store)) = connect().await else {
        return;
    };
    let station_id = insert_station(&pool).await;
    let reporter_id = insert_reporter(&pool, 0).await;
    let window = Duration::hours(24);
    let now = Utc::now();

    let cable = ReputationAward::report_reward(reporter_id, station_id, "broken cable", 2, window);
    let blocked = ReputationAward::report_reward(reporter_id, station_id, "blocked bay", 2, window);
    assert!(store.apply_award(&cable, now).await.unwrap());
    assert!(!store.apply_award(&cable, now).await.unwrap());
    assert!(store.apply_award(&blocked, now).await.unwrap());
    assert_eq!(score(&store, reporter_id).await, 4);
}

// ============================================================================
// Votes
// ============================================================================

#[tokio::test]
#[ignore = "requires CHARGEPULSE_POSTGRES_URL"]
async fn test_upsert_vote_overwrites_inside_window() {
    let Some((pool, store)) = connect().await else {
        return;
    };
    let station_id = insert_station(&pool).await;
    let reporter_id = insert_reporter(&pool, 0).await;
    let window = Duration::minutes(30);
    let now = Utc::now();
    let vote = |value| NewVote {
        station_id,
        reporter_id,
        value,
    };

    let first = store
        .upsert_vote(vote(VoteValue::Working), now - Duration::minutes(10), window)
        .await
        .unwrap();
    let overwritten = store
        .upsert_vote(vote(VoteValue::NotWorking), now, window)
        .await
        .unwrap();
    assert_eq!(overwritten.id, first.id);
    assert_eq!(overwritten.value, VoteValue::NotWorking);

    let later = store
        .upsert_vote(vote(VoteValue::Busy), now + Duration::minutes(31), window)
        .await
        .unwrap();
    assert_ne!(later.id, first.id);

    let history = store
        .vote_history(station_id, now - Duration::hours(1), usize::MAX)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].value, VoteValue::Busy);
    assert_eq!(history[1].value, VoteValue::NotWorking);
}
