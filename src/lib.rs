/*!
 * Educational OS Kernel Library
 * Preemptive priority scheduling exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod time;

// Re-exports
pub use crate::core::{
    KernelError, KernelResult, Pid, Priority, SchedulerConfig, SchedulerError, SchedulerResult,
    Spinlock, SpinlockGuard, Tid, TimestampMs, IDLE_PID,
};
pub use monitoring::init_tracing;
pub use process::scheduler::{install, instance};
pub use process::{
    AgingPriority, Context, ContextSwitch, FiberSwitch, Preemptible, Process, ProcessFactory,
    ProcessScheduler, ProcessSchedulerBuilder, ProcessState, ProcessStats, PriorityPattern,
    SchedulerStats, StrictPriority, SwitchHooks, Thread, ThreadState, TraceSwitch, Transition,
};
pub use time::{TimeProvider, TimerCommand, TimerTask};
