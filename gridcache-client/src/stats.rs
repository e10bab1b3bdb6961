//! Per-cache operation counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation statistics of one cache client.
#[derive(Debug, Default)]
pub struct CacheStats {
    operations: AtomicU64,
    retries: AtomicU64,
    affinity_refreshes: AtomicU64,
    failures: AtomicU64,
}

impl CacheStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refresh(&self) {
        self.affinity_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of operations started.
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    /// Returns the number of attempts beyond the first one.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Returns the number of partition tables installed by refreshes.
    pub fn affinity_refreshes(&self) -> u64 {
        self.affinity_refreshes.load(Ordering::Relaxed)
    }

    /// Returns the number of operations that ended in an error.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
