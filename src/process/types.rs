/*!
 * Process Types
 * Common types for process management and scheduling
 */

use crate::core::types::{Pid, Priority};
use serde::{Deserialize, Serialize};

/// Process lifecycle state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Created by the factory, never admitted
    Created = 0,
    /// Enqueued in a ready queue
    Ready = 1,
    /// Currently dispatched
    Running = 2,
    /// Waiting for an external wakeup; absent from all queues
    Blocked = 3,
    /// Killed, waiting for its resources to be released
    Terminating = 4,
    /// All threads released
    Terminated = 5,
}

impl ProcessState {
    #[inline]
    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Ready,
            2 => Self::Running,
            3 => Self::Blocked,
            4 => Self::Terminating,
            _ => Self::Terminated,
        }
    }

    /// Terminating or terminated
    #[inline]
    pub const fn is_dead(self) -> bool {
        matches!(self, Self::Terminating | Self::Terminated)
    }

    /// May be admitted with `ready()`
    #[inline]
    pub const fn is_admissible(self) -> bool {
        matches!(self, Self::Created | Self::Blocked)
    }
}

/// Thread state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadState {
    Ready = 0,
    Running = 1,
    Blocked = 2,
    Terminated = 3,
}

impl ThreadState {
    #[inline]
    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Ready,
            1 => Self::Running,
            2 => Self::Blocked,
            _ => Self::Terminated,
        }
    }
}

/// Scheduler statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    /// Processes made current (including re-dispatch of the same process)
    pub dispatches: u64,
    /// Transitions that invoked the context-switch primitive
    pub context_switches: u64,
    /// Timer-forced reschedules
    pub preemptions: u64,
    /// Timer ticks skipped because the scheduler lock was held
    pub skipped_ticks: u64,
    /// Thread-safe yields deferred to the next tick
    pub deferred_yields: u64,
    /// Admissions rejected by a full ready queue
    pub rejected: u64,
    /// Processes killed (including self-exit)
    pub kills: u64,
    /// Killed processes whose resources were released
    pub released: u64,
    pub time_slice_ms: u64,
    pub pattern: String,
}

/// Per-process scheduling view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessStats {
    pub pid: Pid,
    pub name: String,
    pub priority: Priority,
    pub state: ProcessState,
    pub threads: usize,
    pub dispatches: u64,
    pub is_current: bool,
}
