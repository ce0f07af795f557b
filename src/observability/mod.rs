//! Observability infrastructure.
//!
//! Provides:
//! - Structured logging via tracing
//! - OpenTelemetry metrics for writes, queue depth, backups and ingestion
//! - In-process counters callers can poll for failure rates

pub mod metrics;
pub mod stats;
pub mod tracing;
