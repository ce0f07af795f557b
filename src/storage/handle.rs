//! The single writable datastore handle.
//!
//! Every mutation and every snapshot copy runs inside the handle's exclusive
//! section. Producers never touch it; only the write worker, the backup
//! scheduler and the engine's lifecycle do.

use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::error::StorageError;
use super::record::WriteCommand;

/// Shared, lockable owner of the datastore connection.
///
/// Cloning shares the same connection. After [`StorageHandle::close`] every
/// operation returns [`StorageError::Closed`].
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl StorageHandle {
    pub fn new(path: PathBuf, conn: Connection) -> Self {
        Self {
            path,
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Path of the datastore file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Prepare, bind, execute and finalize one command under the lock.
    ///
    /// Runs on the blocking pool; the returned future completes only after the
    /// statement has finished and the lock is released.
    pub async fn execute(&self, command: WriteCommand) -> Result<usize, StorageError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<usize, StorageError> {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            let conn = guard.as_ref().ok_or(StorageError::Closed)?;

            let mut stmt = conn.prepare(&command.statement)?;
            let changed = stmt.execute(params_from_iter(command.params.iter()))?;
            Ok(changed)
        })
        .await?
    }

    /// Copy the datastore file to `dest` while holding the exclusive section.
    ///
    /// Returns the number of bytes copied.
    pub async fn snapshot_to(&self, dest: PathBuf) -> Result<u64, StorageError> {
        let conn = Arc::clone(&self.conn);
        let src = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, StorageError> {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            if guard.is_none() {
                return Err(StorageError::Closed);
            }
            Ok(std::fs::copy(&src, &dest)?)
        })
        .await?
    }

    /// Close the connection. A second close is a no-op.
    ///
    /// Blocks the calling thread until an in-flight statement or snapshot
    /// releases the lock; async callers go through the blocking pool.
    pub fn close(&self) -> Result<(), StorageError> {
        let mut guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        match guard.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StorageError::WriteFailed(e))?;
                tracing::info!(path = %self.path.display(), "Datastore closed");
            }
            None => {
                tracing::debug!(path = %self.path.display(), "Datastore already closed");
            }
        }
        Ok(())
    }

    /// Run a closure against the open connection with `query_only` set.
    ///
    /// Statements that would modify the datastore fail with
    /// [`StorageError::WriteFailed`]; mutations go through the write queue.
    pub fn read<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;

        conn.pragma_update(None, "query_only", true)?;
        let result = f(conn);
        conn.pragma_update(None, "query_only", false)?;
        Ok(result?)
    }
}
