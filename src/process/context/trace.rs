/*!
 * Trace Context Switch
 *
 * Deterministic switch that records every transition and resumes the
 * destination immediately on the caller's stack. Entry routines are never run.
 * Used for simulation and for testing scheduling decisions in isolation.
 */

use super::{Context, ContextSwitch, SwitchHooks};
use crate::core::types::Pid;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// One recorded context switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Option<Pid>,
    pub to: Pid,
}

#[derive(Default)]
pub struct TraceSwitch {
    transitions: Mutex<Vec<Transition>>,
    retired: Mutex<Vec<Pid>>,
}

impl TraceSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<Transition> {
        self.transitions.lock().clone()
    }

    /// Destination pids in switch order
    pub fn dispatch_order(&self) -> Vec<Pid> {
        self.transitions.lock().iter().map(|t| t.to).collect()
    }

    pub fn last(&self) -> Option<Transition> {
        self.transitions.lock().last().copied()
    }

    pub fn len(&self) -> usize {
        self.transitions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn retired(&self) -> Vec<Pid> {
        self.retired.lock().clone()
    }

    pub fn clear(&self) {
        self.transitions.lock().clear();
    }
}

impl ContextSwitch for TraceSwitch {
    fn switch(&self, from: Option<&Context>, to: &Context, hooks: &Arc<dyn SwitchHooks>) {
        let transition = Transition {
            from: from.map(Context::pid),
            to: to.pid(),
        };
        trace!(from = ?transition.from, to = transition.to, "trace switch");
        self.transitions.lock().push(transition);

        // The destination resumes right here
        hooks.resumed();
    }

    fn retire(&self, context: &Context) {
        self.retired.lock().push(context.pid());
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}
