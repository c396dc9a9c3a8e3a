/*!
 * Core Module
 * Fundamental kernel types, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod id;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use config::SchedulerConfig;
pub use errors::*;
pub use id::{AtomicGenerator, IdGenerator};
pub use sync::{Spinlock, SpinlockGuard};
pub use types::*;
