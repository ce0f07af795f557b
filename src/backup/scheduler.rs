//! Backup scheduler.
//!
//! Every interval: copy the datastore to a private snapshot file while holding
//! the handle's exclusive section, upload the snapshot, delete it. A failed
//! cycle is logged and counted; the next one runs on schedule.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::uploader::{remote_path_for, UploadError, Uploader};
use crate::observability::metrics::{record_backup, Outcome};
use crate::observability::stats::PipelineStats;
use crate::storage::error::StorageError;
use crate::storage::handle::StorageHandle;

/// Design interval between backups.
pub const DEFAULT_BACKUP_INTERVAL: Duration = Duration::from_secs(600);

/// Why a backup cycle failed.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] StorageError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
}

/// Periodically uploads a snapshot of the datastore.
pub struct BackupScheduler {
    handle: StorageHandle,
    uploader: Arc<dyn Uploader>,
    stats: Arc<PipelineStats>,
    interval: Duration,
}

impl BackupScheduler {
    pub fn new(
        handle: StorageHandle,
        uploader: Arc<dyn Uploader>,
        stats: Arc<PipelineStats>,
        interval: Duration,
    ) -> Self {
        Self {
            handle,
            uploader,
            stats,
            interval,
        }
    }

    /// Local snapshot file: the datastore path with `.snapshot` appended.
    pub fn snapshot_path(&self) -> PathBuf {
        let mut path = OsString::from(self.handle.path().as_os_str());
        path.push(".snapshot");
        PathBuf::from(path)
    }

    /// Remote destination: `/` + the datastore's base name.
    pub fn remote_path(&self) -> String {
        remote_path_for(self.handle.path())
    }

    /// Snapshot and upload once.
    pub async fn run_cycle(&self) -> Result<(), BackupError> {
        let snapshot = self.snapshot_path();
        let bytes = self.handle.snapshot_to(snapshot.clone()).await?;

        let remote = self.remote_path();
        let result = self.uploader.upload(&snapshot, &remote).await;

        if let Err(e) = tokio::fs::remove_file(&snapshot).await {
            tracing::debug!(path = %snapshot.display(), error = %e, "Could not remove snapshot");
        }

        result?;
        tracing::info!(remote_path = %remote, bytes, "Datastore backed up");
        Ok(())
    }

    /// Run cycles until `shutdown` is cancelled. The first cycle runs one
    /// interval after start. The interval must be non-zero.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            remote_path = %self.remote_path(),
            "Backup scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::info!("Backup scheduler stopping");
                    break;
                }

                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(()) => {
                            self.stats.backup_completed();
                            record_backup(Outcome::Ok);
                        }
                        Err(BackupError::Snapshot(StorageError::Closed)) => {
                            tracing::info!("Datastore closed, backup scheduler stopping");
                            break;
                        }
                        Err(e) => {
                            self.stats.backup_failed();
                            record_backup(Outcome::Failed);
                            tracing::warn!(error = %e, "Backup cycle failed");
                        }
                    }
                }
            }
        }
    }
}
