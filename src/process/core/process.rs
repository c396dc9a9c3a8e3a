/*!
 * Process
 * Schedulable unit owning its threads and saved execution context
 */

use super::thread::Thread;
use crate::core::types::{Pid, Priority, Tid};
use crate::process::context::{Context, EntryFn};
use crate::process::types::{ProcessState, ProcessStats};
use parking_lot::Mutex;
use smartstring::alias::String as InlineString;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Process control block
///
/// Scheduling fields (`state`, `priority`, `age`) are atomics so they can be read
/// without the scheduler lock; they are only written while it is held.
pub struct Process {
    pid: Pid,
    name: InlineString,
    priority: AtomicU8,
    state: AtomicU8,
    /// Consecutive slices consumed without blocking (input to priority aging)
    age: AtomicU32,
    dispatches: AtomicU64,
    threads: Mutex<Vec<Arc<Thread>>>,
    context: Context,
}

impl Process {
    #[must_use]
    pub fn new(pid: Pid, name: impl Into<InlineString>, priority: Priority) -> Self {
        Self::build(pid, name.into(), priority, Context::new(pid))
    }

    /// Process whose context starts by running `entry`
    #[must_use]
    pub fn with_entry(
        pid: Pid,
        name: impl Into<InlineString>,
        priority: Priority,
        entry: EntryFn,
    ) -> Self {
        Self::build(pid, name.into(), priority, Context::with_entry(pid, entry))
    }

    fn build(pid: Pid, name: InlineString, priority: Priority, context: Context) -> Self {
        Self {
            pid,
            name,
            priority: AtomicU8::new(priority),
            state: AtomicU8::new(ProcessState::Created as u8),
            age: AtomicU32::new(0),
            dispatches: AtomicU64::new(0),
            threads: Mutex::new(Vec::new()),
            context,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority.load(Ordering::Acquire)
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        ProcessState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Times this process has been made current
    #[inline]
    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    // -------------------------------------------------------------------------
    // Threads
    // -------------------------------------------------------------------------

    /// Attach a new thread; fails once the process is terminating
    pub fn spawn_thread(&self, tid: Tid, name: impl Into<InlineString>) -> Option<Arc<Thread>> {
        if self.state().is_dead() {
            return None;
        }
        let thread = Arc::new(Thread::new(tid, name));
        self.threads.lock().push(Arc::clone(&thread));
        Some(thread)
    }

    /// Detach a thread, terminating it
    pub fn remove_thread(&self, tid: Tid) -> Option<Arc<Thread>> {
        let mut threads = self.threads.lock();
        let pos = threads.iter().position(|t| t.tid() == tid)?;
        let thread = threads.remove(pos);
        thread.terminate();
        Some(thread)
    }

    pub fn threads(&self) -> Vec<Arc<Thread>> {
        self.threads.lock().clone()
    }

    pub fn live_thread_count(&self) -> usize {
        self.threads.lock().iter().filter(|t| t.is_alive()).count()
    }

    /// Terminate and drop every thread, returning how many were released
    pub(crate) fn release_threads(&self) -> usize {
        let mut threads = self.threads.lock();
        for thread in threads.iter() {
            thread.terminate();
        }
        let released = threads.len();
        threads.clear();
        released
    }

    pub fn stats(&self, is_current: bool) -> ProcessStats {
        ProcessStats {
            pid: self.pid,
            name: self.name.to_string(),
            priority: self.priority(),
            state: self.state(),
            threads: self.live_thread_count(),
            dispatches: self.dispatches(),
            is_current,
        }
    }

    // -------------------------------------------------------------------------
    // Scheduler bookkeeping (written under the scheduler lock)
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) fn set_state(&self, state: ProcessState) {
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn set_priority(&self, priority: Priority) {
        self.priority.store(priority, Ordering::Release);
    }

    #[inline]
    pub(crate) fn age(&self) -> u32 {
        self.age.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn grow_older(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn reset_age(&self) {
        self.age.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("priority", &self.priority())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_process_is_created() {
        let process = Process::new(3, "shell", 2);
        assert_eq!(process.pid(), 3);
        assert_eq!(process.name(), "shell");
        assert_eq!(process.priority(), 2);
        assert_eq!(process.state(), ProcessState::Created);
        assert_eq!(process.live_thread_count(), 0);
    }

    #[test]
    fn test_thread_ownership() {
        let process = Process::new(1, "init", 0);
        let main = process.spawn_thread(10, "main").unwrap();
        process.spawn_thread(11, "worker").unwrap();
        assert_eq!(process.live_thread_count(), 2);

        let removed = process.remove_thread(11).unwrap();
        assert!(!removed.is_alive());
        assert_eq!(process.live_thread_count(), 1);
        assert!(process.remove_thread(11).is_none());

        assert_eq!(process.release_threads(), 1);
        assert!(!main.is_alive());
        assert_eq!(process.live_thread_count(), 0);
    }

    #[test]
    fn test_no_threads_after_termination() {
        let process = Process::new(1, "init", 0);
        process.set_state(ProcessState::Terminating);
        assert!(process.spawn_thread(1, "late").is_none());
    }

    #[test]
    fn test_entry_is_taken_once() {
        let process = Process::with_entry(4, "job", 1, Box::new(|| {}));
        assert!(process.context().has_entry());
        assert!(process.context().take_entry().is_some());
        assert!(process.context().take_entry().is_none());
    }
}
