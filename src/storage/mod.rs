//! SQLite storage layer.
//!
//! Provides:
//! - Schema initialization and the liveness probe
//! - A shared handle guarding the single writable connection
//! - A bounded write queue with backpressure
//! - A write worker draining the queue in submission order
//! - The storage engine tying them together with the backup scheduler

pub mod engine;
pub mod error;
pub mod handle;
pub mod queue;
pub mod record;
pub mod schema;
pub mod writer;
