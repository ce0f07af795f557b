//! Backup scheduler integration tests.
//!
//! Tests:
//! - A failed cycle does not prevent the next one
//! - Failed backups do not disturb concurrent writes
//! - The uploaded snapshot is a usable copy of the datastore

mod common;

use chrono::Utc;
use common::{wait_for, ScriptedUploader, TestFixture};
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use ufo_collector::{Record, StorageEngine};

fn record(id: &str) -> Record {
    Record::new(id, Utc::now(), None, "https://example.com", "someone", 0)
}

#[tokio::test]
async fn test_failed_cycle_does_not_stop_the_next() {
    let fixture = TestFixture::new();
    let mut config = fixture.engine_config();
    config.backup_interval = Duration::from_millis(50);

    let uploader = ScriptedUploader::failing_on(vec![0, 1]);
    let engine = StorageEngine::initialize(config, Arc::clone(&uploader) as _).unwrap();

    // Writes keep flowing while the first cycles fail
    for i in 0..20 {
        engine.submit(record(&format!("p{i}"))).await.unwrap();
    }

    assert!(
        wait_for(Duration::from_secs(10), || uploader.call_count() >= 4).await,
        "backup cycles should keep running after failures"
    );
    assert!(wait_for(Duration::from_secs(5), || engine.stats().writes_applied == 20).await);

    let stats = engine.stats();
    assert_eq!(stats.backups_failed, 2);
    assert!(stats.backups_completed >= 1);
    assert_eq!(stats.writes_failed, 0);

    engine.shutdown().await.unwrap();
    engine.join().await;
}

#[tokio::test]
async fn test_uploaded_snapshot_is_a_valid_datastore() {
    let fixture = TestFixture::new();
    let mut config = fixture.engine_config();
    config.backup_interval = Duration::from_millis(100);

    let uploader = ScriptedUploader::failing_on(vec![]);
    let engine = StorageEngine::initialize(config, Arc::clone(&uploader) as _).unwrap();

    engine.submit(record("a")).await.unwrap();
    engine.submit(record("b")).await.unwrap();
    assert!(wait_for(Duration::from_secs(5), || engine.stats().writes_applied == 2).await);

    let start = uploader.call_count();
    assert!(wait_for(Duration::from_secs(5), || uploader.call_count() > start + 1).await);

    engine.shutdown().await.unwrap();
    engine.join().await;

    let (local, remote, bytes) = uploader.uploads.lock().unwrap().last().cloned().unwrap();
    assert_eq!(remote, "/analytics.db");
    assert_eq!(local, fixture.temp_dir.path().join("analytics.db.snapshot"));
    assert!(!local.exists(), "snapshot file should be removed after upload");

    let copy = fixture.temp_dir.path().join("restored.db");
    std::fs::write(&copy, bytes).unwrap();
    let conn = Connection::open(&copy).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM post_history", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_no_backup_before_first_interval() {
    let fixture = TestFixture::new();
    let uploader = ScriptedUploader::failing_on(vec![]);
    // Design interval of ten minutes
    let engine =
        StorageEngine::initialize(fixture.engine_config(), Arc::clone(&uploader) as _).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(uploader.call_count(), 0);

    engine.shutdown().await.unwrap();
    engine.join().await;
}
