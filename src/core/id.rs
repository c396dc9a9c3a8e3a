/*!
 * ID Generation
 * Lock-free id allocation for processes and threads
 */

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Generic ID generator interface
pub trait IdGenerator<T> {
    /// Generate next ID
    fn next(&self) -> T;

    /// Get current counter value (for debugging)
    fn current(&self) -> T;
}

/// Atomic counter for hot paths
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Lock-free atomic operations
#[repr(C, align(64))]
pub struct AtomicGenerator {
    counter: Arc<AtomicU32>,
}

impl AtomicGenerator {
    /// Create new generator starting at given value
    #[inline]
    pub fn new(start: u32) -> Self {
        Self {
            counter: Arc::new(AtomicU32::new(start)),
        }
    }

    /// Create new generator starting at 1 (0 is reserved for the idle process)
    #[inline]
    pub fn default_start() -> Self {
        Self::new(1)
    }
}

impl Clone for AtomicGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: Arc::clone(&self.counter),
        }
    }
}

impl Default for AtomicGenerator {
    fn default() -> Self {
        Self::default_start()
    }
}

impl IdGenerator<u32> for AtomicGenerator {
    #[inline]
    fn next(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    #[inline]
    fn current(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }
}
