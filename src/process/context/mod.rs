/*!
 * Execution Context Switching
 *
 * The scheduler never switches stacks itself. It hands the outgoing and incoming
 * contexts to a `ContextSwitch` implementation, which transfers control and
 * resumes a different logical call stack.
 *
 * # Lock hand-off
 *
 * `switch` is called with the scheduler lock held. The lock is released by the
 * *destination* context as its first action after resuming (`SwitchHooks::resumed`),
 * because that context may itself be suspended inside an earlier `switch` call.
 */

use crate::core::types::Pid;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

mod fiber;
mod trace;

pub use fiber::FiberSwitch;
pub use trace::{TraceSwitch, Transition};

/// Routine a fresh context starts executing
pub type EntryFn = Box<dyn FnOnce() + Send + 'static>;

/// Saved execution state of a process
///
/// The register/stack state itself belongs to the `ContextSwitch` implementation;
/// this only carries identity and the entry routine for the first resumption.
pub struct Context {
    pid: Pid,
    entry: Mutex<Option<EntryFn>>,
}

impl Context {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            entry: Mutex::new(None),
        }
    }

    pub fn with_entry(pid: Pid, entry: EntryFn) -> Self {
        Self {
            pid,
            entry: Mutex::new(Some(entry)),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn has_entry(&self) -> bool {
        self.entry.lock().is_some()
    }

    /// Take the entry routine; only the first resumption gets it
    pub fn take_entry(&self) -> Option<EntryFn> {
        self.entry.lock().take()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("pid", &self.pid)
            .field("has_entry", &self.has_entry())
            .finish()
    }
}

/// Callbacks a switched-to context makes back into the scheduler
pub trait SwitchHooks: Send + Sync {
    /// First action of a context after it resumes: releases the scheduler lock
    fn resumed(&self);

    /// A fresh context's entry routine returned; the process exits.
    ///
    /// May never return (the process is switched away for good, or the
    /// context turns into an idle loop).
    fn finished(&self);
}

/// Low-level transfer of the CPU between execution contexts
pub trait ContextSwitch: Send + Sync {
    /// Save the current state into `from` and resume `to`.
    ///
    /// `from = None` discards the outgoing context (boot flow). When `from` is
    /// later resumed, this call returns in *its* stack, after `hooks.resumed()`.
    fn switch(&self, from: Option<&Context>, to: &Context, hooks: &Arc<dyn SwitchHooks>);

    /// The process owning `context` was released; its saved state can be freed
    fn retire(&self, _context: &Context) {}

    fn name(&self) -> &'static str;
}
