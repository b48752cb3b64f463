//! Per-handler delivery counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing what a handler did with the records it was given.
///
/// `delivered` and `failed` are recorded by the emit task itself, so they
/// also count emits whose caller already gave up on a timeout.
#[derive(Debug, Default)]
pub struct HandlerMetrics {
    delivered: AtomicU64,
    filtered: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

impl HandlerMetrics {
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of emitted records that failed, as a percentage (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed();
        let total = failed + self.delivered();
        if total == 0 {
            return 0.0;
        }
        (failed as f64 / total as f64) * 100.0
    }
}
