/*!
 * Time Module
 * Simulated timer hardware driving scheduler preemption
 */

pub mod provider;
pub mod timer_task;

pub use provider::TimeProvider;
pub use timer_task::{TimerCommand, TimerTask};
