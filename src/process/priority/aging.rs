/*!
 * Priority With Aging
 *
 * A process that keeps giving up the CPU while still runnable (yielding or
 * being preempted) drifts one queue down every `step` such rounds, so
 * processes in lower queues are eventually dispatched. The drift resets when
 * the process blocks, is woken, or has its priority changed.
 */

use super::PriorityPattern;
use crate::core::errors::KernelError;
use crate::core::limits::{DEFAULT_AGING_STEP, DEFAULT_PRIORITY_LEVELS, MAX_PRIORITY_LEVELS};
use crate::core::types::{KernelResult, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgingPriority {
    levels: usize,
    step: u32,
}

impl AgingPriority {
    pub fn new(levels: usize, step: u32) -> KernelResult<Self> {
        if levels == 0 || levels > MAX_PRIORITY_LEVELS {
            return Err(KernelError::Configuration(format!(
                "priority levels must be in 1..={}",
                MAX_PRIORITY_LEVELS
            )));
        }
        if step == 0 {
            return Err(KernelError::Configuration(
                "aging step must be positive".to_string(),
            ));
        }
        Ok(Self { levels, step })
    }

    pub fn step(&self) -> u32 {
        self.step
    }
}

impl Default for AgingPriority {
    fn default() -> Self {
        Self {
            levels: DEFAULT_PRIORITY_LEVELS,
            step: DEFAULT_AGING_STEP,
        }
    }
}

impl PriorityPattern for AgingPriority {
    fn levels(&self) -> usize {
        self.levels
    }

    fn queue_index(&self, priority: Priority, age: u32) -> usize {
        let drift = (age / self.step) as usize;
        (priority as usize)
            .saturating_add(drift)
            .min(self.levels - 1)
    }

    fn name(&self) -> &'static str {
        "aging"
    }
}
