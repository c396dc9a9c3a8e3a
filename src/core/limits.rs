/*!
 * System Limits and Constants
 *
 * Centralized location for scheduler-wide limits and defaults.
 * Performance-critical constants are marked with [PERF].
 */

// =============================================================================
// SCHEDULER LIMITS
// =============================================================================

/// Default time slice before forced preemption (10ms)
/// [PERF] Matches the usual timer tick granularity of teaching kernels
pub const DEFAULT_TIME_SLICE_MS: u64 = 10;

/// Shortest accepted time slice (1ms)
pub const MIN_TIME_SLICE_MS: u64 = 1;

/// Default capacity of each ready queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Upper bound for a single ready queue's capacity
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

/// Default number of priority levels (queues)
pub const DEFAULT_PRIORITY_LEVELS: usize = 5;

/// Maximum number of priority levels (one queue per `Priority` value)
pub const MAX_PRIORITY_LEVELS: usize = 256;

/// Consecutive slices before an aging pattern demotes a process one level
pub const DEFAULT_AGING_STEP: u32 = 4;

// =============================================================================
// TIMER
// =============================================================================

/// Default tick interval of the periodic timer task (1ms)
pub const DEFAULT_TIMER_INTERVAL_MS: u64 = 1;
