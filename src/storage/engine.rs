//! Storage engine: owns the datastore handle, the write queue and the
//! background tasks that share them.
//!
//! Lifecycle:
//! 1. [`StorageEngine::initialize`] opens (or creates) the file, applies the
//!    schema, probes it, then starts the write worker and backup scheduler.
//! 2. Producers call [`StorageEngine::submit`] / [`StorageEngine::enqueue`],
//!    or hold a cloned [`WriteQueue`].
//! 3. [`StorageEngine::shutdown`] cancels both tasks and closes the handle.
//!    Commands still queued at that point are never applied.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::error::StorageError;
use super::handle::StorageHandle;
use super::queue::{WriteQueue, DEFAULT_QUEUE_CAPACITY};
use super::record::{Record, WriteCommand};
use super::schema::open_datastore;
use super::writer::{execute_write, run_write_worker, DEFAULT_STATUS_INTERVAL};
use crate::backup::scheduler::{BackupScheduler, DEFAULT_BACKUP_INTERVAL};
use crate::backup::uploader::Uploader;
use crate::config::Config;
use crate::lifecycle::Lifecycle;
use crate::observability::stats::{PipelineStats, StatsSnapshot};

/// Settings for the storage core.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Datastore file, created on first run.
    pub db_path: PathBuf,
    /// Write queue capacity; at least 1.
    pub queue_capacity: usize,
    /// How often the write worker reports queue depth.
    pub status_interval: Duration,
    /// How often the backup scheduler uploads a snapshot.
    pub backup_interval: Duration,
}

impl EngineConfig {
    /// Design values for everything but the path.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            status_interval: DEFAULT_STATUS_INTERVAL,
            backup_interval: DEFAULT_BACKUP_INTERVAL,
        }
    }

    /// Create an EngineConfig from application config values.
    pub fn from_config(config: &Config) -> Self {
        Self {
            db_path: config.db_path.clone(),
            queue_capacity: config.write_queue_size,
            status_interval: config.queue_report_interval(),
            backup_interval: config.backup_interval(),
        }
    }

    /// Reject zero timer periods; tokio intervals cannot tick at zero.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.status_interval.is_zero() {
            return Err(StorageError::ZeroInterval("status_interval"));
        }
        if self.backup_interval.is_zero() {
            return Err(StorageError::ZeroInterval("backup_interval"));
        }
        Ok(())
    }
}

/// The storage core. Construct once per process and share by reference.
#[derive(Debug)]
pub struct StorageEngine {
    handle: StorageHandle,
    queue: WriteQueue,
    stats: Arc<PipelineStats>,
    lifecycle: Lifecycle,
}

impl StorageEngine {
    /// Open the datastore and start the write worker and backup scheduler.
    ///
    /// Must be called from within a tokio runtime, at most once per datastore.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ZeroInterval`] for a zero status or backup
    /// interval, and [`StorageError::Unavailable`] if the file cannot be
    /// created or opened, or the liveness probe fails. Nothing is started in
    /// either case.
    pub fn initialize(
        config: EngineConfig,
        uploader: Arc<dyn Uploader>,
    ) -> Result<Self, StorageError> {
        config.validate()?;
        let conn = open_datastore(&config.db_path)?;
        let handle = StorageHandle::new(config.db_path.clone(), conn);

        let lifecycle = Lifecycle::new();
        let stats = Arc::new(PipelineStats::new());
        let (queue, receiver) = WriteQueue::new(config.queue_capacity.max(1), lifecycle.token());

        lifecycle.start(
            "write-worker",
            run_write_worker(
                receiver,
                handle.clone(),
                Arc::clone(&stats),
                config.status_interval,
                lifecycle.token(),
            ),
        );

        let scheduler = BackupScheduler::new(
            handle.clone(),
            uploader,
            Arc::clone(&stats),
            config.backup_interval,
        );
        lifecycle.start("backup-scheduler", scheduler.run(lifecycle.token()));

        tracing::info!(
            path = %config.db_path.display(),
            queue_capacity = queue.capacity(),
            backup_interval_secs = config.backup_interval.as_secs(),
            "Storage engine initialized"
        );

        Ok(Self {
            handle,
            queue,
            stats,
            lifecycle,
        })
    }

    /// Map a record to its insert command and enqueue it.
    ///
    /// Performs no I/O. `Ok` means the queue accepted the command, not that the
    /// row was written.
    pub async fn submit(&self, record: Record) -> Result<(), StorageError> {
        self.queue.submit(record).await
    }

    /// Enqueue an arbitrary command, waiting while the queue is full.
    pub async fn enqueue(&self, command: WriteCommand) -> Result<(), StorageError> {
        self.queue.enqueue(command).await
    }

    /// Enqueue without waiting.
    pub fn try_enqueue(&self, command: WriteCommand) -> Result<(), StorageError> {
        self.queue.try_enqueue(command)
    }

    /// Execute one command directly, bypassing the queue.
    ///
    /// Statement failures are logged and swallowed like in the worker.
    pub async fn execute_write(&self, command: WriteCommand) -> Result<(), StorageError> {
        execute_write(&self.handle, &self.stats, command).await
    }

    /// Producer handle for collaborators such as the ingestion loop.
    pub fn queue(&self) -> WriteQueue {
        self.queue.clone()
    }

    pub fn handle(&self) -> &StorageHandle {
        &self.handle
    }

    pub fn db_path(&self) -> &Path {
        self.handle.path()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Counters for applied/failed writes and completed/failed backups.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        !self.lifecycle.is_stopped()
    }

    /// Signal both background tasks to stop, then close the handle.
    ///
    /// Does not wait for the tasks. An in-flight statement or snapshot copy
    /// finishes before the handle closes; that wait happens on the blocking
    /// pool. Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        if self.lifecycle.is_stopped() {
            tracing::debug!("Storage engine already shut down");
        } else {
            tracing::info!(
                pending = self.queue.depth(),
                "Shutting down storage engine"
            );
            self.lifecycle.stop();
        }
        let handle = self.handle.clone();
        tokio::task::spawn_blocking(move || handle.close()).await?
    }

    /// Wait for the background tasks to exit after [`StorageEngine::shutdown`].
    pub async fn join(&self) {
        self.lifecycle.join().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::uploader::UploadError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct NoopUploader;

    #[async_trait]
    impl Uploader for NoopUploader {
        async fn upload(&self, _local_path: &Path, _remote_path: &str) -> Result<(), UploadError> {
            Ok(())
        }
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::new("analytics.db");
        assert_eq!(config.queue_capacity, 200);
        assert_eq!(config.status_interval, Duration::from_secs(30));
        assert_eq!(config.backup_interval, Duration::from_secs(600));
    }

    #[test]
    fn test_engine_config_from_config() {
        let config = Config::test_config(PathBuf::from("x.db"));
        let engine_config = EngineConfig::from_config(&config);
        assert_eq!(engine_config.db_path, PathBuf::from("x.db"));
        assert_eq!(engine_config.queue_capacity, 8);
    }

    #[tokio::test]
    async fn test_initialize_unavailable_starts_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = EngineConfig::new(temp_dir.path().join("nope").join("analytics.db"));

        let err = StorageEngine::initialize(config, Arc::new(NoopUploader)).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_initialize_rejects_zero_intervals() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("analytics.db");

        let mut config = EngineConfig::new(&db_path);
        config.status_interval = Duration::ZERO;
        let err = StorageEngine::initialize(config, Arc::new(NoopUploader)).unwrap_err();
        assert!(matches!(err, StorageError::ZeroInterval("status_interval")));

        let mut config = EngineConfig::new(&db_path);
        config.backup_interval = Duration::ZERO;
        let err = StorageEngine::initialize(config, Arc::new(NoopUploader)).unwrap_err();
        assert!(matches!(err, StorageError::ZeroInterval("backup_interval")));

        // Rejected before the datastore is touched
        assert!(!db_path.exists());
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let config = EngineConfig::new(temp_dir.path().join("analytics.db"));
        let engine = StorageEngine::initialize(config, Arc::new(NoopUploader)).unwrap();
        assert!(engine.is_running());

        engine.shutdown().await.unwrap();
        engine.shutdown().await.unwrap();
        engine.join().await;

        assert!(!engine.is_running());
        assert!(!engine.handle().is_open());
        assert!(matches!(
            engine.submit(Record::new("a", chrono::Utc::now(), None, "u", "x", 0)).await,
            Err(StorageError::ShuttingDown)
        ));
    }
}
