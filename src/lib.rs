//! UFO Collector: polls a paginated listing API and records every post once.
//!
//! Posts land in a local SQLite file through a single-writer persistence
//! layer; the file is periodically mirrored to Dropbox.
//!
//! # Architecture
//!
//! - **Bounded write queue**: ingestion stalls instead of growing memory when
//!   the writer falls behind
//! - **Single writer**: every mutation goes through one worker and one handle
//! - **Best-effort append**: a rejected row is logged and counted, never fatal
//! - **Periodic backup**: a snapshot of the datastore is uploaded on a timer
//!
//! # Modules
//!
//! - [`backup`]: Uploader contract, Dropbox client, backup scheduler
//! - [`config`]: CLI and environment configuration
//! - [`ingest`]: Listing client and polling loop
//! - [`lifecycle`]: Background task start/stop
//! - [`observability`]: Tracing, metrics and in-process counters
//! - [`storage`]: Storage engine, write queue and write worker

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::error::StorageError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod backup;
pub mod config;
pub mod ingest;
pub mod lifecycle;
pub mod observability;
pub mod storage;

pub use storage::engine::{EngineConfig, StorageEngine};
pub use storage::error::StorageError;
pub use storage::record::{Record, WriteCommand};
