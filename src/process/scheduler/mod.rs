/*!
 * Process Scheduler
 *
 * Preemptive priority-queue scheduler for a single CPU. Ready processes wait in
 * one bounded FIFO per priority level; the highest non-empty level is always
 * served first, and the idle process runs when every queue is empty.
 *
 * # Locking
 *
 * All ready-queue and current-process state sits behind one `Spinlock`. Normal
 * context acquires it by spinning; the timer interrupt only ever uses
 * `try_acquire` and skips the tick on contention. The lock is held across the
 * context switch and released by the context that resumes.
 */

use crate::core::config::SchedulerConfig;
use crate::core::sync::Spinlock;
use crate::core::types::Priority;
use crate::process::context::{ContextSwitch, SwitchHooks, TraceSwitch};
use crate::process::core::Process;
use crate::process::priority::PriorityPattern;
use crate::process::types::SchedulerStats;
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::info;

mod atomic_stats;
mod builder;
mod capability;
mod dispatch;
mod instance;
mod operations;
mod queue;

use atomic_stats::AtomicSchedulerStats;

pub use builder::ProcessSchedulerBuilder;
pub use capability::Preemptible;
#[cfg(test)]
pub use capability::MockPreemptible;
pub use instance::{install, instance};
pub use queue::ReadyQueueSet;

/// State mutated by more than one context; only touched with `lock` held
struct SchedulerState {
    queues: ReadyQueueSet,
    current: Option<Arc<Process>>,
    /// Killed processes whose resources have not been released yet
    reaper: Vec<Arc<Process>>,
}

/// Preemptive priority-queue process scheduler
pub struct ProcessScheduler {
    lock: Spinlock,
    state: UnsafeCell<SchedulerState>,
    pattern: Box<dyn PriorityPattern>,
    switch: Arc<dyn ContextSwitch>,
    config: SchedulerConfig,
    idle: Arc<Process>,

    initialized: AtomicBool,
    started: AtomicBool,
    // Set by a contended yield_thread_safe, consumed by the next timer tick
    yield_pending: AtomicBool,
    /// Latest timestamp seen from the timer
    clock_ms: AtomicU64,
    /// Start of the current time slice; written with the lock held
    last_timestamp_ms: AtomicU64,

    stats: AtomicSchedulerStats,
    me: Weak<ProcessScheduler>,
}

// SAFETY: `state` is only accessed while `lock` is held (see `state()`); every
// other field is immutable after construction or atomic.
unsafe impl Sync for ProcessScheduler {}

impl ProcessScheduler {
    /// Scheduler with the given pattern, default configuration, trace switch and idle process
    pub fn new(pattern: impl PriorityPattern + 'static) -> Arc<Self> {
        let idle = Arc::new(builder::default_idle(&pattern));
        Self::from_parts(
            Box::new(pattern),
            Arc::new(TraceSwitch::new()),
            SchedulerConfig::default(),
            idle,
        )
    }

    pub fn builder() -> ProcessSchedulerBuilder {
        ProcessSchedulerBuilder::new()
    }

    pub(crate) fn from_parts(
        pattern: Box<dyn PriorityPattern>,
        switch: Arc<dyn ContextSwitch>,
        config: SchedulerConfig,
        idle: Arc<Process>,
    ) -> Arc<Self> {
        info!(
            pattern = pattern.name(),
            levels = pattern.levels(),
            switch = switch.name(),
            time_slice_ms = config.time_slice_ms,
            queue_capacity = config.queue_capacity,
            "Process scheduler created"
        );

        let queues = ReadyQueueSet::new(pattern.levels(), config.queue_capacity);
        Arc::new_cyclic(|me| Self {
            lock: Spinlock::new(),
            state: UnsafeCell::new(SchedulerState {
                queues,
                current: None,
                reaper: Vec::new(),
            }),
            pattern,
            switch,
            config,
            idle,
            initialized: AtomicBool::new(false),
            started: AtomicBool::new(false),
            yield_pending: AtomicBool::new(false),
            clock_ms: AtomicU64::new(0),
            last_timestamp_ms: AtomicU64::new(0),
            stats: AtomicSchedulerStats::new(),
            me: me.clone(),
        })
    }

    /// # Safety
    /// The caller must hold `self.lock`, and the reference must not be used after
    /// the lock is released or handed to a context switch.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    unsafe fn state(&self) -> &mut SchedulerState {
        &mut *self.state.get()
    }

    #[inline]
    fn is_idle(&self, process: &Arc<Process>) -> bool {
        Arc::ptr_eq(process, &self.idle)
    }

    fn hooks(&self) -> Option<Arc<dyn SwitchHooks>> {
        self.me
            .upgrade()
            .map(|me| me as Arc<dyn SwitchHooks>)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The scheduler-wide lock. Holding it blocks all dispatching.
    pub fn lock(&self) -> &Spinlock {
        &self.lock
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn pattern(&self) -> &dyn PriorityPattern {
        self.pattern.as_ref()
    }

    pub fn idle_process(&self) -> &Arc<Process> {
        &self.idle
    }

    /// Largest valid priority value
    pub fn max_priority(&self) -> Priority {
        self.pattern.max_priority()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Start of the current time slice
    pub fn last_timestamp_ms(&self) -> u64 {
        self.last_timestamp_ms.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
            .snapshot(self.config.time_slice_ms, self.pattern.name())
    }
}

impl fmt::Debug for ProcessScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessScheduler")
            .field("pattern", &self.pattern.name())
            .field("switch", &self.switch.name())
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}
