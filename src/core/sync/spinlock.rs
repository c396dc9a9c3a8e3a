/*!
 * Spinlock
 *
 * Busy-wait mutual exclusion usable from interrupt context and before any
 * threading subsystem exists. Never parks, never calls into the host OS.
 */

use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};

const UNLOCKED: bool = false;
const LOCKED: bool = true;

/// Two-state atomic lock
///
/// `release()` is unconditional: the lock does not track its owner, which is what
/// allows a lock taken in one execution context to be released by the context
/// that is switched to.
#[derive(Debug)]
pub struct Spinlock {
    state: AtomicBool,
}

impl Spinlock {
    pub const fn new() -> Self {
        Self {
            state: AtomicBool::new(UNLOCKED),
        }
    }

    /// Spin until the lock is observed free and claimed
    #[inline]
    pub fn acquire(&self) {
        while !self.try_acquire() {
            // Test-and-test-and-set: wait on plain loads to keep the cache line shared
            while self.state.load(Ordering::Relaxed) == LOCKED {
                hint::spin_loop();
            }
        }
    }

    /// Claim the lock without waiting
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn release(&self) {
        self.state.store(UNLOCKED, Ordering::Release);
    }

    /// Observational only; racy by nature. Use `try_acquire` to act on it.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) == LOCKED
    }

    /// Acquire and return an RAII guard
    #[inline]
    pub fn lock(&self) -> SpinlockGuard<'_> {
        self.acquire();
        SpinlockGuard { lock: self }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_>> {
        // Lazily built: a guard constructed on failure would release someone else's lock on drop
        self.try_acquire().then(|| SpinlockGuard { lock: self })
    }
}

impl Default for Spinlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the lock on drop
#[must_use = "dropping the guard releases the lock immediately"]
pub struct SpinlockGuard<'a> {
    lock: &'a Spinlock,
}

impl Drop for SpinlockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
