//! The write worker: the only path that mutates the datastore.
//!
//! Drains the write queue strictly in order, one command at a time. A failed
//! command is logged, counted and dropped; the worker keeps going. On shutdown
//! the worker exits at its next wake point and whatever is still queued is
//! abandoned.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::error::StorageError;
use super::handle::StorageHandle;
use super::record::WriteCommand;
use crate::observability::metrics::{record_queue_depth, record_write, Outcome};
use crate::observability::stats::PipelineStats;

/// Design interval between queue depth reports.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Execute one command, logging and swallowing statement failures.
///
/// Only a closed or poisoned handle is returned as an error; the command is
/// dropped in every case.
pub async fn execute_write(
    handle: &StorageHandle,
    stats: &PipelineStats,
    command: WriteCommand,
) -> Result<(), StorageError> {
    match handle.execute(command).await {
        Ok(changed) => {
            stats.write_applied();
            record_write(Outcome::Ok);
            tracing::trace!(changed, "Write command applied");
            Ok(())
        }
        Err(StorageError::WriteFailed(e)) => {
            stats.write_failed();
            record_write(Outcome::Failed);
            tracing::warn!(error = %e, "Write command failed, dropping it");
            Ok(())
        }
        Err(e) => {
            stats.write_failed();
            record_write(Outcome::Failed);
            Err(e)
        }
    }
}

/// Run the write worker until `shutdown` is cancelled or the queue closes.
///
/// `status_interval` must be non-zero; [`crate::StorageEngine::initialize`]
/// rejects zero before spawning the worker.
pub async fn run_write_worker(
    mut receiver: mpsc::Receiver<WriteCommand>,
    handle: StorageHandle,
    stats: Arc<PipelineStats>,
    status_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut status = interval_at(Instant::now() + status_interval, status_interval);
    status.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(path = %handle.path().display(), "Write worker started");

    loop {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                let abandoned = receiver.len();
                if abandoned > 0 {
                    tracing::warn!(abandoned, "Write worker stopping with queued commands");
                } else {
                    tracing::info!("Write worker stopping");
                }
                break;
            }

            next = receiver.recv() => {
                let Some(command) = next else {
                    tracing::info!("Write queue closed, write worker stopping");
                    break;
                };
                if let Err(e) = execute_write(&handle, &stats, command).await {
                    tracing::error!(error = %e, "Write command not applied");
                }
            }

            _ = status.tick() => {
                let depth = receiver.len();
                record_queue_depth(depth);
                tracing::info!(depth, "Write queue depth");
            }
        }
    }
}
