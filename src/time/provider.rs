/*!
 * Time Provider
 * Monotonic millisecond clock that delivers timer interrupts to the scheduler
 */

use crate::core::types::TimestampMs;
use crate::process::scheduler::Preemptible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Simulated hardware timer
///
/// Every `tick` advances the clock and invokes the target's interrupt hook on
/// the calling thread, which plays the part of interrupt context.
pub struct TimeProvider {
    target: Arc<dyn Preemptible>,
    clock_ms: AtomicU64,
}

impl TimeProvider {
    pub fn new(target: Arc<dyn Preemptible>) -> Self {
        Self::starting_at(target, 0)
    }

    pub fn starting_at(target: Arc<dyn Preemptible>, start_ms: TimestampMs) -> Self {
        Self {
            target,
            clock_ms: AtomicU64::new(start_ms),
        }
    }

    /// Milliseconds since boot
    #[inline]
    pub fn now(&self) -> TimestampMs {
        self.clock_ms.load(Ordering::Acquire)
    }

    /// Advance the clock by `elapsed_ms` and raise the timer interrupt.
    /// Returns the timestamp delivered.
    pub fn tick(&self, elapsed_ms: u64) -> TimestampMs {
        let now = self
            .clock_ms
            .fetch_add(elapsed_ms, Ordering::AcqRel)
            .saturating_add(elapsed_ms);
        trace!(now, "timer interrupt");
        self.target.on_timer_interrupt(now);
        now
    }

    /// Request a yield on behalf of interrupt-context code
    pub fn request_yield(&self) -> bool {
        self.target.yield_thread_safe()
    }
}
