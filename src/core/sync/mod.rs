/*!
 * Synchronization Primitives
 *
 * Busy-wait locking for code that may run in interrupt context. Blocking
 * primitives (mutexes that park) are not safe at this level of the kernel.
 */

mod spinlock;

pub use spinlock::{Spinlock, SpinlockGuard};
