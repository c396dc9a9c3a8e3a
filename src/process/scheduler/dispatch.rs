/*!
 * Dispatching
 *
 * Start-up, voluntary yields and timer preemption. Every path ends in
 * `reschedule_locked`, which is entered with the lock held and returns after
 * the lock has been released, either directly or by the context that resumes
 * after the switch.
 *
 * Nothing in this module may keep an RAII guard alive across a switch: a
 * retired context never returns through its frames normally.
 */

use super::{ProcessScheduler, SchedulerState};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::TimestampMs;
use crate::process::core::Process;
use crate::process::types::ProcessState;
use std::hint;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, trace, warn};

/// What happens to the outgoing process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Outgoing {
    /// Voluntary yield: back to the tail of its queue, one round older
    Yield,
    /// Slice expired: back to the tail of its queue, one round older
    Preempt,
    /// Leaves the queues until `ready()` wakes it
    Block,
    /// Already terminating; never re-enqueued
    Retire,
}

impl ProcessScheduler {
    /// Mark the platform ready for scheduling. Timer ticks before this are ignored.
    pub fn set_initialized(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!("Process scheduler initialized");
        }
    }

    pub(super) fn ensure_started(&self) -> SchedulerResult<()> {
        if self.is_started() {
            Ok(())
        } else {
            Err(SchedulerError::NotStarted)
        }
    }

    /// Dispatch the first process.
    ///
    /// The calling (boot) context is abandoned: it is never saved and never
    /// resumed. With a switch that runs contexts on their own stacks this call
    /// still returns to the boot code, which must not touch the scheduler as if
    /// it were a process afterwards.
    pub fn start(&self) -> SchedulerResult<()> {
        if !self.is_initialized() {
            return Err(SchedulerError::NotInitialized);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyStarted);
        }

        self.lock.acquire();
        // SAFETY: lock held; `state` is not used after `dispatch`
        let state = unsafe { self.state() };
        let next = state
            .queues
            .pop_highest()
            .unwrap_or_else(|| Arc::clone(&self.idle));

        info!(
            "Process scheduler started (first process: {}, switch: {})",
            next.pid(),
            self.switch.name()
        );
        self.dispatch(state, None, next);
        Ok(())
    }

    /// Give up the CPU. The caller goes to the tail of its queue and the highest
    /// priority ready process runs; if that is the caller, it simply continues.
    pub fn yield_now(&self) -> SchedulerResult<()> {
        self.ensure_started()?;
        self.reap();

        self.lock.acquire();
        self.reschedule_locked(Outgoing::Yield);
        Ok(())
    }

    /// Yield only if the lock is free right now; otherwise set a deferred-yield
    /// request that the next timer tick honors regardless of the slice.
    ///
    /// Safe to call from interrupt context.
    pub fn yield_thread_safe(&self) -> bool {
        if !self.is_started() {
            return false;
        }
        if !self.lock.try_acquire() {
            self.yield_pending.store(true, Ordering::Release);
            self.stats.inc_deferred_yields();
            trace!("Yield deferred: scheduler lock contended");
            return false;
        }

        self.yield_pending.store(false, Ordering::Release);
        self.reschedule_locked(Outgoing::Yield);
        true
    }

    /// Timer interrupt handler.
    ///
    /// Preempts the running process once its time slice has elapsed or a
    /// deferred yield is pending. Never spins: if the lock is held the tick is
    /// skipped and the preemption retried on the next one.
    pub fn on_timer_interrupt(&self, timestamp_ms: TimestampMs) {
        self.clock_ms.fetch_max(timestamp_ms, Ordering::AcqRel);

        if !self.is_initialized() || !self.is_started() {
            return;
        }

        let pending = self.yield_pending.load(Ordering::Acquire);
        let elapsed = timestamp_ms.saturating_sub(self.last_timestamp_ms.load(Ordering::Acquire));
        if !pending && elapsed < self.config.time_slice_ms {
            return;
        }

        if !self.lock.try_acquire() {
            self.stats.inc_skipped_ticks();
            trace!(timestamp_ms, "Timer tick skipped: scheduler lock held");
            return;
        }

        self.yield_pending.store(false, Ordering::Release);
        self.stats.inc_preemptions();
        trace!(timestamp_ms, elapsed, pending, "Preempting current process");
        self.reschedule_locked(Outgoing::Preempt);
    }

    /// Body of the idle context once its entry routine has returned.
    ///
    /// The idle process has nowhere to exit to: it spins until something is
    /// waiting in a ready queue, then yields the CPU to it.
    pub(super) fn idle_loop(&self) -> ! {
        debug!("Idle loop entered");
        loop {
            if !self.is_process_waiting() {
                hint::spin_loop();
                thread::yield_now();
                continue;
            }
            if let Err(e) = self.yield_now() {
                warn!("Idle yield failed: {}", e);
            }
        }
    }

    /// Move the current process out per `outgoing` and dispatch the next one.
    ///
    /// Must be called with the lock held; returns with it released.
    pub(super) fn reschedule_locked(&self, outgoing: Outgoing) {
        // SAFETY: caller holds the lock; `state` is not used after `dispatch`
        let state = unsafe { self.state() };
        let previous = state.current.clone();

        if let Some(prev) = previous.as_ref().filter(|p| !self.is_idle(p)) {
            match outgoing {
                Outgoing::Yield | Outgoing::Preempt if prev.state() == ProcessState::Running => {
                    prev.grow_older();
                    let index = self.pattern.queue_index(prev.priority(), prev.age());
                    prev.set_state(ProcessState::Ready);

                    if let Err(prev) = state.queues.push(index, Arc::clone(prev)) {
                        // No room to re-enqueue: keep running it for another slice
                        prev.set_state(ProcessState::Running);
                        self.stats.inc_rejected();
                        self.last_timestamp_ms
                            .store(self.clock_ms.load(Ordering::Acquire), Ordering::Release);
                        warn!(
                            "Ready queue {} full; process {} keeps the CPU",
                            index,
                            prev.pid()
                        );
                        self.lock.release();
                        return;
                    }
                }
                Outgoing::Block => {
                    prev.set_state(ProcessState::Blocked);
                    prev.reset_age();
                    debug!("Process {} blocked", prev.pid());
                }
                _ => {}
            }
        }

        let next = state
            .queues
            .pop_highest()
            .unwrap_or_else(|| Arc::clone(&self.idle));
        self.dispatch(state, previous, next);
    }

    /// Make `next` current and switch to it.
    ///
    /// Releases the lock (directly when no switch is needed, otherwise through
    /// the resumed context's `SwitchHooks::resumed`).
    fn dispatch(
        &self,
        state: &mut SchedulerState,
        previous: Option<Arc<Process>>,
        next: Arc<Process>,
    ) {
        self.last_timestamp_ms
            .store(self.clock_ms.load(Ordering::Acquire), Ordering::Release);
        next.set_state(ProcessState::Running);
        next.record_dispatch();
        self.stats.inc_dispatches();
        state.current = Some(Arc::clone(&next));

        if previous.as_ref().is_some_and(|p| Arc::ptr_eq(p, &next)) {
            self.lock.release();
            return;
        }
        if let Some(idle) = previous.as_ref().filter(|p| self.is_idle(p)) {
            idle.set_state(ProcessState::Ready);
        }

        let Some(hooks) = self.hooks() else {
            warn!("Scheduler is not shared; cannot switch to process {}", next.pid());
            self.lock.release();
            return;
        };

        self.stats.inc_context_switches();
        debug!(
            from = ?previous.as_ref().map(|p| p.pid()),
            to = next.pid(),
            "Context switch"
        );
        self.switch.switch(
            previous.as_deref().map(Process::context),
            next.context(),
            &hooks,
        );
    }
}
