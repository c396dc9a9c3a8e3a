/*!
 * Scheduler Configuration
 *
 * Runtime configuration for time slicing and ready-queue sizing
 */

use super::errors::KernelError;
use super::limits::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_TIME_SLICE_MS, MAX_QUEUE_CAPACITY, MIN_TIME_SLICE_MS,
};
use super::types::KernelResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable overriding the time slice
pub const ENV_TIME_SLICE_MS: &str = "KERNEL_SCHED_TIME_SLICE_MS";
/// Environment variable overriding the per-queue capacity
pub const ENV_QUEUE_CAPACITY: &str = "KERNEL_SCHED_QUEUE_CAPACITY";
/// Environment variable controlling whether the idle process is counted
pub const ENV_COUNT_IDLE: &str = "KERNEL_SCHED_COUNT_IDLE";

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SchedulerConfig {
    /// Maximum time a process runs before the timer preempts it
    pub time_slice_ms: u64,
    /// Capacity of each ready queue
    pub queue_capacity: usize,
    /// Include the idle process in process/thread counts
    pub count_idle: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_slice_ms: DEFAULT_TIME_SLICE_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            count_idle: false,
        }
    }
}

impl SchedulerConfig {
    /// Short slices for latency-sensitive workloads
    pub const fn interactive() -> Self {
        Self {
            time_slice_ms: 2,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            count_idle: false,
        }
    }

    /// Long slices and deep queues for throughput
    pub const fn batch() -> Self {
        Self {
            time_slice_ms: 50,
            queue_capacity: 1024,
            count_idle: false,
        }
    }

    pub fn with_time_slice_ms(mut self, time_slice_ms: u64) -> Self {
        self.time_slice_ms = time_slice_ms;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_count_idle(mut self, count_idle: bool) -> Self {
        self.count_idle = count_idle;
        self
    }

    /// Check that all values are usable by the scheduler
    pub fn validate(&self) -> KernelResult<()> {
        if self.time_slice_ms < MIN_TIME_SLICE_MS {
            return Err(KernelError::Configuration(format!(
                "time_slice_ms must be at least {}",
                MIN_TIME_SLICE_MS
            )));
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(KernelError::Configuration(format!(
                "queue_capacity must be in 1..={}",
                MAX_QUEUE_CAPACITY
            )));
        }
        Ok(())
    }

    /// Defaults overridden by `KERNEL_SCHED_*` environment variables
    pub fn from_env() -> KernelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test maps)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KernelResult<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_TIME_SLICE_MS) {
            config.time_slice_ms = parse_value(ENV_TIME_SLICE_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_QUEUE_CAPACITY) {
            config.queue_capacity = parse_value(ENV_QUEUE_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_COUNT_IDLE) {
            config.count_idle = value == "1" || value.eq_ignore_ascii_case("true");
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> KernelResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| KernelError::Configuration(format!("{} has invalid value '{}'", key, value)))
}
