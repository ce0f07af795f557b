//! Bounded write queue between producers and the write worker.
//!
//! A full queue suspends [`WriteQueue::enqueue`] until the worker frees a slot
//! or shutdown is signalled, so a stalled writer stalls ingestion instead of
//! growing memory.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::StorageError;
use super::record::{Record, WriteCommand};

/// Design capacity of the write queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// Producer side of the write queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WriteQueue {
    sender: mpsc::Sender<WriteCommand>,
    shutdown: CancellationToken,
}

impl WriteQueue {
    /// Create a queue and the receiver the write worker drains.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(
        capacity: usize,
        shutdown: CancellationToken,
    ) -> (Self, mpsc::Receiver<WriteCommand>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, shutdown }, receiver)
    }

    /// Enqueue a command, waiting for a free slot if the queue is full.
    ///
    /// Returns [`StorageError::ShuttingDown`] once shutdown is signalled or the
    /// worker is gone. Acceptance says nothing about the write's outcome.
    pub async fn enqueue(&self, command: WriteCommand) -> Result<(), StorageError> {
        if self.shutdown.is_cancelled() {
            return Err(StorageError::ShuttingDown);
        }

        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(StorageError::ShuttingDown),
            sent = self.sender.send(command) => sent.map_err(|_| StorageError::ShuttingDown),
        }
    }

    /// Enqueue without waiting; a full queue returns [`StorageError::QueueFull`].
    pub fn try_enqueue(&self, command: WriteCommand) -> Result<(), StorageError> {
        if self.shutdown.is_cancelled() {
            return Err(StorageError::ShuttingDown);
        }

        self.sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => StorageError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => StorageError::ShuttingDown,
        })
    }

    /// Map a record to its insert command and enqueue it.
    pub async fn submit(&self, record: Record) -> Result<(), StorageError> {
        self.enqueue(WriteCommand::from(record)).await
    }

    /// Commands currently waiting.
    pub fn depth(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}
