/*!
 * Thread
 * Unit of execution owned by exactly one process
 */

use crate::core::types::Tid;
use crate::process::types::ThreadState;
use smartstring::alias::String as InlineString;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

pub struct Thread {
    tid: Tid,
    name: InlineString,
    state: AtomicU8,
}

impl Thread {
    #[must_use]
    pub fn new(tid: Tid, name: impl Into<InlineString>) -> Self {
        Self {
            tid,
            name: name.into(),
            state: AtomicU8::new(ThreadState::Ready as u8),
        }
    }

    #[inline]
    pub fn tid(&self) -> Tid {
        self.tid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn state(&self) -> ThreadState {
        ThreadState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state() != ThreadState::Terminated
    }

    /// Update state; terminated threads stay terminated
    pub fn set_state(&self, state: ThreadState) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != ThreadState::Terminated as u8).then_some(state as u8)
            })
            .is_ok()
    }

    pub(crate) fn terminate(&self) {
        self.state
            .store(ThreadState::Terminated as u8, Ordering::Release);
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("tid", &self.tid)
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
