//! In-process pipeline counters.
//!
//! Per-command and per-cycle failures are swallowed by the write worker and
//! the backup scheduler; these counters are how callers still see them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated by the background tasks.
#[derive(Debug, Default)]
pub struct PipelineStats {
    writes_applied: AtomicU64,
    writes_failed: AtomicU64,
    backups_completed: AtomicU64,
    backups_failed: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub writes_applied: u64,
    pub writes_failed: u64,
    pub backups_completed: u64,
    pub backups_failed: u64,
}

impl StatsSnapshot {
    /// Share of executed writes that failed, in `[0, 1]`.
    pub fn write_failure_rate(&self) -> f64 {
        let total = self.writes_applied + self.writes_failed;
        if total == 0 {
            return 0.0;
        }
        self.writes_failed as f64 / total as f64
    }
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_applied(&self) {
        self.writes_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_failed(&self) {
        self.writes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn backup_completed(&self) {
        self.backups_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn backup_failed(&self) {
        self.backups_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            writes_applied: self.writes_applied.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
            backups_completed: self.backups_completed.load(Ordering::Relaxed),
            backups_failed: self.backups_failed.load(Ordering::Relaxed),
        }
    }
}
