/*!
 * Process Factory
 * Allocates unique process and thread ids and builds process control blocks
 */

use crate::core::id::{AtomicGenerator, IdGenerator};
use crate::core::types::{Pid, Priority, Tid, IDLE_PID};
use crate::process::context::EntryFn;
use crate::process::core::{Process, Thread};
use std::sync::Arc;
use tracing::debug;

/// Creates processes with unique pids
///
/// Pid 0 is reserved for the idle process. Cloning shares the counters.
#[derive(Clone, Default)]
pub struct ProcessFactory {
    pids: AtomicGenerator,
    tids: AtomicGenerator,
}

impl ProcessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// New process with a main thread, in the `Created` state
    pub fn create(&self, name: &str, priority: Priority) -> Arc<Process> {
        let pid = self.next_pid();
        self.finish(Process::new(pid, name, priority))
    }

    /// New process whose context starts by running `entry`
    pub fn create_with_entry<F>(&self, name: &str, priority: Priority, entry: F) -> Arc<Process>
    where
        F: FnOnce() + Send + 'static,
    {
        let pid = self.next_pid();
        let entry: EntryFn = Box::new(entry);
        self.finish(Process::with_entry(pid, name, priority, entry))
    }

    /// Attach another thread to `process`; `None` once it is terminating
    pub fn spawn_thread(&self, process: &Process, name: &str) -> Option<Arc<Thread>> {
        process.spawn_thread(self.tids.next(), name)
    }

    /// Most recently allocated pid
    pub fn last_pid(&self) -> Pid {
        self.pids.current().saturating_sub(1)
    }

    fn next_pid(&self) -> Pid {
        let mut pid = self.pids.next();
        // Skip the idle pid after wraparound
        if pid == IDLE_PID {
            pid = self.pids.next();
        }
        pid
    }

    fn finish(&self, process: Process) -> Arc<Process> {
        let tid: Tid = self.tids.next();
        process.spawn_thread(tid, "main");
        debug!(
            "Process {} '{}' created (priority: {})",
            process.pid(),
            process.name(),
            process.priority()
        );
        Arc::new(process)
    }
}
