/*!
 * Ready Queues
 * One bounded FIFO per priority level plus a location index for O(1) lookup
 */

use crate::core::types::Pid;
use crate::process::core::Process;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Bounded per-level FIFO queues of runnable processes
///
/// A pid is present in at most one queue; a second process object carrying a
/// queued pid is refused, and lookups by process check object identity. Not
/// synchronized; the scheduler only touches it with its lock held.
pub struct ReadyQueueSet {
    queues: Vec<VecDeque<Arc<Process>>>,
    capacity: usize,
    // Process location index for O(1) membership checks
    locations: HashMap<Pid, usize>,
}

impl ReadyQueueSet {
    pub fn new(levels: usize, capacity: usize) -> Self {
        Self {
            queues: (0..levels)
                .map(|_| VecDeque::with_capacity(capacity.min(64)))
                .collect(),
            capacity,
            locations: HashMap::new(),
        }
    }

    #[inline]
    pub fn levels(&self) -> usize {
        self.queues.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append to the tail of queue `index`.
    ///
    /// Hands the process back if that queue is full, `index` is out of range,
    /// or its pid is already queued.
    pub fn push(&mut self, index: usize, process: Arc<Process>) -> Result<(), Arc<Process>> {
        if self.locations.contains_key(&process.pid()) {
            return Err(process);
        }
        let Some(queue) = self.queues.get_mut(index) else {
            return Err(process);
        };
        if queue.len() >= self.capacity {
            return Err(process);
        }
        self.locations.insert(process.pid(), index);
        queue.push_back(process);
        Ok(())
    }

    /// Head of the highest-priority non-empty queue
    pub fn peek_highest(&self) -> Option<&Arc<Process>> {
        self.queues.iter().find_map(|queue| queue.front())
    }

    pub fn pop_highest(&mut self) -> Option<Arc<Process>> {
        let process = self
            .queues
            .iter_mut()
            .find(|queue| !queue.is_empty())?
            .pop_front()?;
        self.locations.remove(&process.pid());
        Some(process)
    }

    /// Remove `process` from whichever queue holds it.
    ///
    /// Another process object that merely shares its pid is left in place.
    pub fn remove(&mut self, process: &Arc<Process>) -> Option<Arc<Process>> {
        let index = *self.locations.get(&process.pid())?;
        let queue = &mut self.queues[index];
        let pos = queue.iter().position(|p| Arc::ptr_eq(p, process))?;
        self.locations.remove(&process.pid());
        queue.remove(pos)
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.locations.contains_key(&pid)
    }

    /// Queue index currently holding `process`
    pub fn location(&self, process: &Arc<Process>) -> Option<usize> {
        let index = *self.locations.get(&process.pid())?;
        self.queues[index]
            .iter()
            .any(|p| Arc::ptr_eq(p, process))
            .then_some(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn len_at(&self, index: usize) -> usize {
        self.queues.get(index).map_or(0, VecDeque::len)
    }

    pub fn is_full(&self, index: usize) -> bool {
        self.len_at(index) >= self.capacity
    }

    /// Pids in queue `index`, head first
    pub fn pids_at(&self, index: usize) -> Vec<Pid> {
        self.queues
            .get(index)
            .map(|queue| queue.iter().map(|p| p.pid()).collect())
            .unwrap_or_default()
    }

    /// All queued processes, highest priority first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Process>> {
        self.queues.iter().flat_map(|queue| queue.iter())
    }
}
