/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Thread ID type
pub type Tid = u32;

/// Priority level (0 is the most important, bounded by the installed priority pattern)
pub type Priority = u8;

/// Monotonic timestamp in milliseconds since boot
pub type TimestampMs = u64;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Pid reserved for the idle process
pub const IDLE_PID: Pid = 0;
