/*!
 * Scheduler Operations
 * Admission, priority changes, termination, blocking, reaping and queries
 */

use super::dispatch::Outgoing;
use super::{ProcessScheduler, SchedulerState};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{Pid, Priority};
use crate::process::core::Process;
use crate::process::types::{ProcessState, ProcessStats};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl ProcessScheduler {
    /// Admit a created or blocked process to the tail of its priority queue.
    ///
    /// Accepted before `start()`. Fails with `QueueFull` when the queue is at
    /// capacity, leaving the process untouched.
    pub fn ready(&self, process: &Arc<Process>) -> SchedulerResult<()> {
        if self.is_idle(process) {
            return Err(SchedulerError::IdleProcess);
        }

        let _guard = self.lock.lock();
        // SAFETY: lock held by `_guard`
        self.admit_locked(unsafe { self.state() }, process)
    }

    /// `ready()` for interrupt context: gives up instead of spinning.
    ///
    /// Returns `Ok(false)` when the lock was contended and nothing happened.
    pub fn try_ready(&self, process: &Arc<Process>) -> SchedulerResult<bool> {
        if self.is_idle(process) {
            return Err(SchedulerError::IdleProcess);
        }
        let Some(_guard) = self.lock.try_lock() else {
            return Ok(false);
        };

        // SAFETY: lock held by `_guard`
        self.admit_locked(unsafe { self.state() }, process)
            .map(|()| true)
    }

    fn admit_locked(&self, state: &mut SchedulerState, process: &Arc<Process>) -> SchedulerResult<()> {
        let priority = process.priority();
        if !self.pattern.accepts(priority) {
            return Err(SchedulerError::InvalidPriority {
                priority,
                max: self.pattern.max_priority(),
            });
        }

        let prior = process.state();
        if !prior.is_admissible() {
            return Err(SchedulerError::InvalidState {
                pid: process.pid(),
                state: prior,
            });
        }

        if state.queues.contains(process.pid()) {
            // Another process object with this pid is already waiting
            return Err(SchedulerError::InvalidState {
                pid: process.pid(),
                state: ProcessState::Ready,
            });
        }

        let index = self.pattern.queue_index(priority, 0);
        if let Err(process) = state.queues.push(index, Arc::clone(process)) {
            self.stats.inc_rejected();
            warn!(
                "Ready queue {} full; process {} rejected",
                index,
                process.pid()
            );
            return Err(SchedulerError::QueueFull { priority });
        }

        process.reset_age();
        process.set_state(ProcessState::Ready);
        debug!(
            "Process {} ready (priority: {}, queue: {})",
            process.pid(),
            priority,
            index
        );
        Ok(())
    }

    /// Change a process's priority, returning the previous one.
    ///
    /// A queued process moves to the tail of its new queue. If that queue is
    /// full the change is rejected and the process stays where it was. The
    /// idle process keeps its priority.
    pub fn change_priority(
        &self,
        process: &Arc<Process>,
        priority: Priority,
    ) -> SchedulerResult<Priority> {
        if self.is_idle(process) {
            return Err(SchedulerError::IdleProcess);
        }
        if !self.pattern.accepts(priority) {
            return Err(SchedulerError::InvalidPriority {
                priority,
                max: self.pattern.max_priority(),
            });
        }

        let result = {
            let _guard = self.lock.lock();
            // SAFETY: lock held by `_guard`
            self.change_priority_locked(unsafe { self.state() }, process, priority)
        };

        if let Ok(old) = result {
            info!(
                "Process {} priority changed: {} -> {}",
                process.pid(),
                old,
                priority
            );
        }
        result
    }

    fn change_priority_locked(
        &self,
        state: &mut SchedulerState,
        process: &Arc<Process>,
        priority: Priority,
    ) -> SchedulerResult<Priority> {
        let pid = process.pid();
        let current_state = process.state();
        if current_state.is_dead() {
            return Err(SchedulerError::InvalidState {
                pid,
                state: current_state,
            });
        }

        let old = process.priority();
        let Some(from) = state.queues.location(process) else {
            // Not queued (running, blocked or never admitted): takes effect on next enqueue
            process.set_priority(priority);
            process.reset_age();
            return Ok(old);
        };

        let to = self.pattern.queue_index(priority, 0);
        if to != from && state.queues.is_full(to) {
            self.stats.inc_rejected();
            return Err(SchedulerError::QueueFull { priority });
        }

        if let Some(queued) = state.queues.remove(process) {
            process.set_priority(priority);
            process.reset_age();
            if let Err(queued) = state.queues.push(to, queued) {
                // Unreachable after the capacity check; put it back where it was
                process.set_priority(old);
                let _ = state.queues.push(from, queued);
                return Err(SchedulerError::QueueFull { priority });
            }
        }
        Ok(old)
    }

    /// Terminate a process.
    ///
    /// It leaves the ready queues at once; its threads are released later by
    /// `reap()` from normal context. Killing the current process switches away
    /// from it for good.
    pub fn kill(&self, process: &Arc<Process>) -> SchedulerResult<()> {
        if self.is_idle(process) {
            return Err(SchedulerError::IdleProcess);
        }

        self.lock.acquire();
        // SAFETY: lock held; `state` is not used after the lock is released or rescheduled
        let state = unsafe { self.state() };

        let prior = process.state();
        if prior.is_dead() {
            self.lock.release();
            return Err(SchedulerError::InvalidState {
                pid: process.pid(),
                state: prior,
            });
        }

        state.queues.remove(process);
        process.set_state(ProcessState::Terminating);
        state.reaper.push(Arc::clone(process));
        self.stats.inc_kills();

        let is_current = state
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, process));
        info!(
            "Process {} killed (was {:?}, current: {})",
            process.pid(),
            prior,
            is_current
        );

        if is_current && self.is_started() {
            // Only returns when the switch runs the next process on this stack
            self.reschedule_locked(Outgoing::Retire);
        } else {
            self.lock.release();
        }
        self.reap();
        Ok(())
    }

    /// Terminate the calling (current) process
    pub fn exit(&self) -> SchedulerResult<()> {
        self.ensure_started()?;
        let current = self.current_process();
        self.kill(&current)
    }

    /// Take the current process off the CPU until `ready()` wakes it
    pub fn block(&self) -> SchedulerResult<()> {
        self.ensure_started()?;
        self.reap();

        self.lock.acquire();
        // SAFETY: lock held; only read before rescheduling
        let is_idle = unsafe { self.state() }
            .current
            .as_ref()
            .map_or(true, |current| self.is_idle(current));
        if is_idle {
            self.lock.release();
            return Err(SchedulerError::IdleProcess);
        }

        self.reschedule_locked(Outgoing::Block);
        Ok(())
    }

    /// Release the threads of killed processes and mark them terminated.
    ///
    /// Must run in normal context. The current process is never reaped; it is
    /// picked up by the next call after it has been switched away from.
    pub fn reap(&self) -> usize {
        let dead: Vec<Arc<Process>> = {
            let _guard = self.lock.lock();
            // SAFETY: lock held by `_guard`
            let state = unsafe { self.state() };
            let current = state.current.clone();
            let (dead, keep) = state.reaper.drain(..).partition(|process| {
                !current
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, process))
            });
            state.reaper = keep;
            dead
        };

        for process in &dead {
            let threads = process.release_threads();
            process.set_state(ProcessState::Terminated);
            self.switch.retire(process.context());
            info!(
                "Process {} terminated ({} threads released)",
                process.pid(),
                threads
            );
        }
        self.stats.add_released(dead.len() as u64);
        dead.len()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The running process, or the idle process before `start()`
    pub fn current_process(&self) -> Arc<Process> {
        let _guard = self.lock.lock();
        // SAFETY: lock held by `_guard`
        unsafe { self.state() }
            .current
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.idle))
    }

    /// Process the next dispatch would select, without removing it
    pub fn next_process(&self) -> Arc<Process> {
        let _guard = self.lock.lock();
        // SAFETY: lock held by `_guard`
        unsafe { self.state() }
            .queues
            .peek_highest()
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.idle))
    }

    /// Whether any process is waiting in a ready queue
    pub fn is_process_waiting(&self) -> bool {
        let _guard = self.lock.lock();
        // SAFETY: lock held by `_guard`
        !unsafe { self.state() }.queues.is_empty()
    }

    /// Queued and running processes (the idle process only if configured)
    pub fn process_count(&self) -> usize {
        self.live_processes().len()
    }

    /// Live threads across queued and running processes
    pub fn thread_count(&self) -> usize {
        self.live_processes()
            .iter()
            .map(|process| process.live_thread_count())
            .sum()
    }

    /// Pids waiting at queue `index`, head first
    pub fn queued_pids(&self, index: usize) -> Vec<Pid> {
        let _guard = self.lock.lock();
        // SAFETY: lock held by `_guard`
        unsafe { self.state() }.queues.pids_at(index)
    }

    /// Per-process statistics for every live process, running one first
    pub fn processes(&self) -> Vec<ProcessStats> {
        let current = self.current_process();
        self.live_processes()
            .iter()
            .map(|process| process.stats(Arc::ptr_eq(process, &current)))
            .collect()
    }

    /// Snapshot of running + queued processes, taken under the lock
    fn live_processes(&self) -> Vec<Arc<Process>> {
        let mut live = {
            let _guard = self.lock.lock();
            // SAFETY: lock held by `_guard`
            let state = unsafe { self.state() };

            let mut live = Vec::with_capacity(state.queues.len() + 1);
            match &state.current {
                Some(current) if self.is_idle(current) => {}
                Some(current) if !current.state().is_dead() => live.push(Arc::clone(current)),
                _ => {}
            }
            live.extend(state.queues.iter().cloned());
            live
        };

        if self.config.count_idle {
            live.push(Arc::clone(&self.idle));
        }
        live
    }
}
