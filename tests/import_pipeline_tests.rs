//! Import pipeline integration tests
//!
//! Drives the real client and orchestrator against a synthetic
//! congress.gov upstream served from an ephemeral local listener, with
//! an in-memory SQLite store.

use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Duration;

use capitol_sync::config::Config;
use capitol_sync::db;
use capitol_sync::error::Error;
use capitol_sync::models::{ImportStatus, SessionRange};
use capitol_sync::services::{CongressClient, ImportOrchestrator};

mod mock_upstream;
use mock_upstream::{members, MockUpstream};

/// Pipeline config pointed at the mock upstream, with fast pacing
fn test_config(base_url: String) -> Config {
    let mut config = Config::with_api_key("test-key".to_string());
    config.api_base_url = base_url;
    config.retry.base_delay = Duration::from_millis(5);
    config.batch_pause = Duration::from_millis(10);
    config.requests_per_second = 1000;
    config
}

/// One connection so every pool handle sees the same in-memory database
async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

async fn lock_count(pool: &SqlitePool) -> i64 {
    use sqlx::Row;
    sqlx::query("SELECT COUNT(*) AS n FROM system_locks")
        .fetch_one(pool)
        .await
        .unwrap()
        .get("n")
}

#[tokio::test]
async fn pagination_runs_to_the_first_short_page() {
    // 250-member pages at offsets 0, 250, 500 and a 37-member final page
    let mock = MockUpstream::with_sessions(HashMap::from([(119u16, members("P", 787))]));
    let base_url = mock.clone().spawn().await;

    let client = CongressClient::new(&test_config(base_url)).unwrap();
    let result = client.list_members(119).await.unwrap();

    assert_eq!(result.len(), 787);
    assert_eq!(
        mock.request_log(),
        vec![(119, 0), (119, 250), (119, 500), (119, 750)]
    );
}

#[tokio::test]
async fn an_exact_multiple_needs_one_empty_page() {
    // 500 members: two full pages, then an empty page ends the loop
    let mock = MockUpstream::with_sessions(HashMap::from([(118u16, members("E", 500))]));
    let base_url = mock.clone().spawn().await;

    let client = CongressClient::new(&test_config(base_url)).unwrap();
    let result = client.list_members(118).await.unwrap();

    assert_eq!(result.len(), 500);
    assert_eq!(mock.request_log(), vec![(118, 0), (118, 250), (118, 500)]);
}

#[tokio::test]
async fn a_failing_fetch_is_attempted_exactly_three_times() {
    let mock = MockUpstream {
        fail_all: true,
        ..MockUpstream::default()
    };
    let base_url = mock.clone().spawn().await;

    let client = CongressClient::new(&test_config(base_url)).unwrap();
    let err = client.list_members(119).await.unwrap_err();

    assert_eq!(mock.attempt_count(), 3);
    match err {
        Error::Fetch {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("status 500"));
            assert!(last_error.contains("upstream exploded"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn end_to_end_import_over_two_sessions() {
    let mock = MockUpstream::with_sessions(HashMap::from([
        (101u16, members("A", 5)),
        (100u16, members("B", 3)),
    ]));
    let base_url = mock.clone().spawn().await;
    let pool = test_pool().await;

    let orchestrator = ImportOrchestrator::new(pool.clone(), &test_config(base_url)).unwrap();
    let result = orchestrator
        .run(SessionRange::new(101, 100).unwrap())
        .await
        .unwrap();

    assert_eq!(result.status, ImportStatus::Success);
    assert_eq!(result.imported, 8);
    assert_eq!(result.updated, 0);
    assert!(result.errors.is_none());

    // Sessions processed in descending order: all of 101 before 100
    let congresses: Vec<u16> = mock.request_log().iter().map(|(c, _)| *c).collect();
    assert_eq!(congresses, vec![101, 100]);

    // Lock released after the run
    assert_eq!(lock_count(&pool).await, 0);
}

#[tokio::test]
async fn reimporting_unchanged_data_is_idempotent() {
    let mock = MockUpstream::with_sessions(HashMap::from([(101u16, members("A", 5))]));
    let base_url = mock.spawn().await;
    let pool = test_pool().await;

    let orchestrator = ImportOrchestrator::new(pool.clone(), &test_config(base_url)).unwrap();
    let range = SessionRange::new(101, 101).unwrap();

    let first = orchestrator.run(range).await.unwrap();
    assert_eq!((first.imported, first.updated), (5, 0));

    let second = orchestrator.run(range).await.unwrap();
    assert_eq!(second.status, ImportStatus::Success);
    assert_eq!((second.imported, second.updated), (0, 5));

    // Still exactly one row per bioguideId, with unchanged fields
    assert_eq!(db::legislators::count(&pool).await.unwrap(), 5);
    let row = db::legislators::load_legislator(&pool, "A000000")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.full_name.as_deref(), Some("Member A000000"));
    assert_eq!(row.party.as_deref(), Some("Independent"));
}

#[tokio::test]
async fn one_bad_record_does_not_abort_its_batch() {
    // A full batch of 10 where one record has no bioguideId
    let mut session = members("F", 9);
    session.insert(4, json!({"fullName": "No Id Here"}));
    let mock = MockUpstream::with_sessions(HashMap::from([(118u16, session)]));
    let base_url = mock.spawn().await;
    let pool = test_pool().await;

    let orchestrator = ImportOrchestrator::new(pool.clone(), &test_config(base_url)).unwrap();
    let result = orchestrator
        .run(SessionRange::new(118, 118).unwrap())
        .await
        .unwrap();

    assert_eq!(result.status, ImportStatus::Success);
    assert_eq!(result.imported, 9);
    assert_eq!(result.updated, 0);
    let errors = result.errors.unwrap();
    assert_eq!(errors, vec!["unknown: missing bioguideId".to_string()]);
    assert_eq!(db::legislators::count(&pool).await.unwrap(), 9);
}

#[tokio::test]
async fn a_held_lock_blocks_the_run_without_writes() {
    let mock = MockUpstream::with_sessions(HashMap::from([(119u16, members("L", 3))]));
    let base_url = mock.clone().spawn().await;
    let pool = test_pool().await;

    let range = SessionRange::new(119, 100).unwrap();
    assert!(db::locks::acquire(&pool, &range.lock_key()).await.unwrap());

    let orchestrator = ImportOrchestrator::new(pool.clone(), &test_config(base_url)).unwrap();
    let result = orchestrator.run(range).await.unwrap();

    assert_eq!(result.status, ImportStatus::Locked);
    assert_eq!(result.imported, 0);
    assert_eq!(result.updated, 0);

    // Zero store writes and zero upstream traffic while locked
    assert_eq!(db::legislators::count(&pool).await.unwrap(), 0);
    assert!(mock.request_log().is_empty());

    // The blocked run must not have removed the original holder's lock
    assert_eq!(lock_count(&pool).await, 1);
}

#[tokio::test]
async fn a_session_fetch_failure_ends_the_run_and_releases_the_lock() {
    // Congress 101 imports cleanly, congress 100 can't be fetched
    let mock = MockUpstream {
        fail_congress: Some(100),
        ..MockUpstream::with_sessions(HashMap::from([
            (101u16, members("A", 5)),
            (100u16, members("B", 3)),
        ]))
    };
    let base_url = mock.spawn().await;
    let pool = test_pool().await;

    let orchestrator = ImportOrchestrator::new(pool.clone(), &test_config(base_url)).unwrap();
    let range = SessionRange::new(101, 100).unwrap();
    let result = orchestrator.run(range).await.unwrap();

    // Escalated: run ends early with the totals accumulated before the failure
    assert_eq!(result.status, ImportStatus::Error);
    assert_eq!(result.imported, 5);
    let errors = result.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("3 attempts"));

    // The failing session's data was never persisted
    assert_eq!(db::legislators::count(&pool).await.unwrap(), 5);

    // Lock released on the failure path too: a fresh run can start
    assert_eq!(lock_count(&pool).await, 0);
    assert!(db::locks::acquire(&pool, &range.lock_key()).await.unwrap());
}
