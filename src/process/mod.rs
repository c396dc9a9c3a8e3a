/*!
 * Process Module
 * Process model, priority patterns, context switching and scheduling
 */

pub mod context;
pub mod core;
pub mod factory;
pub mod priority;
pub mod scheduler;
pub mod types;

// Re-export for convenience
pub use context::{Context, ContextSwitch, EntryFn, FiberSwitch, SwitchHooks, TraceSwitch, Transition};
pub use self::core::{Process, Thread};
pub use factory::ProcessFactory;
pub use priority::{AgingPriority, PriorityPattern, StrictPriority};
pub use scheduler::{Preemptible, ProcessScheduler, ProcessSchedulerBuilder, ReadyQueueSet};
pub use types::{ProcessState, ProcessStats, SchedulerStats, ThreadState};
