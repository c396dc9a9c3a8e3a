/*!
 * Lock-Free Scheduler Statistics
 * Atomic counters that are safe to bump from interrupt context
 */

use crate::process::types::SchedulerStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic scheduler statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Default)]
pub struct AtomicSchedulerStats {
    dispatches: AtomicU64,
    context_switches: AtomicU64,
    preemptions: AtomicU64,
    skipped_ticks: AtomicU64,
    deferred_yields: AtomicU64,
    rejected: AtomicU64,
    kills: AtomicU64,
    released: AtomicU64,
}

impl AtomicSchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called from the timer interrupt on lock contention
    #[inline(always)]
    pub fn inc_skipped_ticks(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_deferred_yields(&self) {
        self.deferred_yields.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_kills(&self) {
        self.kills.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_released(&self, count: u64) {
        self.released.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    ///
    /// # Note
    /// Counter values may not be perfectly consistent with each other due to concurrent updates,
    /// but each individual value is accurate. This is acceptable for monitoring.
    pub fn snapshot(&self, time_slice_ms: u64, pattern: &str) -> SchedulerStats {
        SchedulerStats {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            deferred_yields: self.deferred_yields.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            time_slice_ms,
            pattern: pattern.to_string(),
        }
    }
}
