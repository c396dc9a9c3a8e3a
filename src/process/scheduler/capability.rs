/*!
 * Scheduler Capabilities
 *
 * Narrow views of the scheduler handed to its collaborators. The timer only
 * needs to preempt; a switched-to context only needs to release the lock or
 * report that its entry routine returned. The idle context never finishes:
 * it falls into the idle loop instead.
 */

use super::ProcessScheduler;
use crate::core::types::TimestampMs;
use crate::process::context::SwitchHooks;
use tracing::warn;

/// Interrupt-safe entry points of a scheduler
///
/// Implementations must never block: both methods may run while the
/// interrupted context holds the scheduler lock.
#[cfg_attr(test, mockall::automock)]
pub trait Preemptible: Send + Sync {
    /// Timer tick carrying the current monotonic time in milliseconds
    fn on_timer_interrupt(&self, timestamp_ms: TimestampMs);

    /// Yield if the scheduler lock is free; otherwise defer to the next tick.
    /// Returns whether the yield happened immediately.
    fn yield_thread_safe(&self) -> bool;
}

impl Preemptible for ProcessScheduler {
    fn on_timer_interrupt(&self, timestamp_ms: TimestampMs) {
        ProcessScheduler::on_timer_interrupt(self, timestamp_ms);
    }

    fn yield_thread_safe(&self) -> bool {
        ProcessScheduler::yield_thread_safe(self)
    }
}

impl SwitchHooks for ProcessScheduler {
    fn resumed(&self) {
        self.lock.release();
    }

    fn finished(&self) {
        if self.is_idle(&self.current_process()) {
            self.idle_loop();
        }
        if let Err(e) = self.exit() {
            warn!("Entry routine returned but exit failed: {}", e);
        }
    }
}
