//! Error type for the storage core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the storage engine, its handle and the write queue.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The datastore file could not be created, opened or probed.
    #[error("datastore unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A timer interval was configured as zero.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    /// A single write command was rejected (e.g. duplicate primary key).
    #[error("write failed: {0}")]
    WriteFailed(#[from] rusqlite::Error),

    /// The handle was closed by shutdown.
    #[error("storage handle is closed")]
    Closed,

    /// The write queue no longer accepts commands.
    #[error("write queue is shutting down")]
    ShuttingDown,

    /// Non-blocking enqueue found no free slot.
    #[error("write queue is full")]
    QueueFull,

    /// A thread panicked while holding the handle's exclusive section.
    #[error("storage handle lock poisoned")]
    LockPoisoned,

    /// Copying the datastore file for a backup failed.
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] std::io::Error),

    /// The blocking task running a statement did not complete.
    #[error("storage task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
