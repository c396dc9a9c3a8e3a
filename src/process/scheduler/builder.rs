/*!
 * Scheduler Builder
 * Fluent construction with validated configuration
 */

use super::ProcessScheduler;
use crate::core::config::SchedulerConfig;
use crate::core::types::{KernelResult, IDLE_PID};
use crate::process::context::{ContextSwitch, TraceSwitch};
use crate::process::core::Process;
use crate::process::priority::{PriorityPattern, StrictPriority};
use std::sync::Arc;

/// Idle process used when none is supplied; it sits at the lowest priority.
/// It has no entry routine: a context that runs it goes straight to the idle loop.
pub(super) fn default_idle(pattern: &dyn PriorityPattern) -> Process {
    Process::new(IDLE_PID, "idle", pattern.max_priority())
}

/// Builder for `ProcessScheduler`
#[derive(Default)]
pub struct ProcessSchedulerBuilder {
    pattern: Option<Box<dyn PriorityPattern>>,
    switch: Option<Arc<dyn ContextSwitch>>,
    config: Option<SchedulerConfig>,
    idle: Option<Arc<Process>>,
}

impl ProcessSchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Priority pattern (defaults to `StrictPriority` with 5 levels)
    pub fn with_pattern(mut self, pattern: impl PriorityPattern + 'static) -> Self {
        self.pattern = Some(Box::new(pattern));
        self
    }

    /// Context switch primitive (defaults to `TraceSwitch`)
    pub fn with_switch(mut self, switch: Arc<dyn ContextSwitch>) -> Self {
        self.switch = Some(switch);
        self
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Process dispatched when every ready queue is empty
    pub fn with_idle(mut self, idle: Arc<Process>) -> Self {
        self.idle = Some(idle);
        self
    }

    pub fn build(self) -> KernelResult<Arc<ProcessScheduler>> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let pattern = self
            .pattern
            .unwrap_or_else(|| Box::new(StrictPriority::default()));
        let switch = self
            .switch
            .unwrap_or_else(|| Arc::new(TraceSwitch::new()));
        let idle = self
            .idle
            .unwrap_or_else(|| Arc::new(default_idle(pattern.as_ref())));

        Ok(ProcessScheduler::from_parts(pattern, switch, config, idle))
    }
}
