//! Test utilities shared by the integration tests.
//!
//! Provides:
//! - Temporary datastore fixtures
//! - Scriptable uploaders
//! - Polling helpers for asynchronous outcomes

#![allow(dead_code)]

use async_trait::async_trait;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use ufo_collector::backup::{UploadError, Uploader};
use ufo_collector::EngineConfig;

/// Test fixture that manages a temporary datastore directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for the datastore
    pub temp_dir: TempDir,
    /// Path to the datastore file
    pub db_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("analytics.db");
        Self { temp_dir, db_path }
    }

    /// Engine config with design values but a short status interval.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::new(&self.db_path);
        config.status_interval = Duration::from_millis(50);
        config
    }

    /// Ids in `post_history`, in insertion order, read through a separate connection.
    pub fn stored_ids(&self) -> Vec<String> {
        stored_ids(&self.db_path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stored_ids(db_path: &Path) -> Vec<String> {
    let conn = Connection::open(db_path).expect("failed to open datastore");
    let mut stmt = conn
        .prepare("SELECT id FROM post_history ORDER BY rowid")
        .expect("failed to prepare");
    let ids = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to query")
        .collect::<Result<Vec<String>, _>>()
        .expect("failed to read rows");
    ids
}

/// Uploader that records each call and can be told to fail.
#[derive(Default)]
pub struct ScriptedUploader {
    /// Calls whose zero-based index is listed here fail.
    pub fail_calls: Vec<usize>,
    pub calls: AtomicUsize,
    pub uploads: Mutex<Vec<(PathBuf, String, Vec<u8>)>>,
}

impl ScriptedUploader {
    pub fn failing_on(fail_calls: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            fail_calls,
            ..Self::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), UploadError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.contains(&call) {
            return Err(UploadError::Rejected {
                status: 503,
                body: format!("scripted failure on call {call}"),
            });
        }
        let bytes = tokio::fs::read(local_path).await?;
        self.uploads.lock().unwrap().push((
            local_path.to_path_buf(),
            remote_path.to_string(),
            bytes,
        ));
        Ok(())
    }
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
