/*!
 * Priority Patterns
 *
 * Pluggable policy mapping a process priority to a ready-queue index. The
 * scheduler consults the pattern when a process is admitted, requeued or
 * re-prioritized, never while picking the next process.
 */

use crate::core::types::Priority;

mod aging;
mod strict;

pub use aging::AgingPriority;
pub use strict::StrictPriority;

/// Maps priorities to ready queues
///
/// Queue index 0 is served first. Priority 0 is the most important value.
pub trait PriorityPattern: Send + Sync {
    /// Number of ready queues to allocate
    fn levels(&self) -> usize;

    /// Largest valid priority value
    fn max_priority(&self) -> Priority {
        (self.levels().saturating_sub(1)).min(Priority::MAX as usize) as Priority
    }

    /// Queue for a process of `priority` that has been requeued `age` times
    /// in a row without blocking. Must return a value below `levels()`.
    fn queue_index(&self, priority: Priority, age: u32) -> usize;

    /// Whether `priority` is within range
    fn accepts(&self, priority: Priority) -> bool {
        priority <= self.max_priority()
    }

    fn name(&self) -> &'static str;
}
