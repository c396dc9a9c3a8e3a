/*!
 * Fiber Context Switch
 *
 * Emulates stack switching on a hosted system: every context is backed by its
 * own host thread, and exactly one of them holds the baton at a time. A switch
 * hands the baton to the destination and parks the caller until some later
 * switch hands it back.
 *
 * Timer interrupts must be delivered on the fiber that currently holds the
 * baton (the running process), as they would be on a real CPU.
 */

use super::{Context, ContextSwitch, EntryFn, SwitchHooks};
use crate::core::types::Pid;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Parked,
    Resume,
    Retire,
}

/// Unwind payload that discards a retired fiber's stack
struct Retired;

struct Fiber {
    signal: Mutex<Signal>,
    cond: Condvar,
}

impl Fiber {
    fn new() -> Self {
        Self {
            signal: Mutex::new(Signal::Parked),
            cond: Condvar::new(),
        }
    }

    fn send(&self, signal: Signal) {
        let mut current = self.signal.lock();
        // Retirement is final
        if *current != Signal::Retire {
            *current = signal;
        }
        self.cond.notify_one();
    }

    /// Park until resumed or retired
    fn wait(&self) -> Signal {
        let mut current = self.signal.lock();
        while *current == Signal::Parked {
            self.cond.wait(&mut current);
        }
        let received = *current;
        if received == Signal::Resume {
            *current = Signal::Parked;
        }
        received
    }
}

/// Host-thread backed context switch
#[derive(Default)]
pub struct FiberSwitch {
    fibers: DashMap<Pid, Arc<Fiber>>,
}

impl FiberSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of contexts that currently own a fiber
    pub fn live_fibers(&self) -> usize {
        self.fibers.len()
    }

    fn fiber_for(&self, pid: Pid) -> Arc<Fiber> {
        Arc::clone(
            self.fibers
                .entry(pid)
                .or_insert_with(|| Arc::new(Fiber::new()))
                .value(),
        )
    }

    /// Start the host thread behind a context that has never run
    fn launch(&self, context: &Context, hooks: &Arc<dyn SwitchHooks>) -> Option<Arc<Fiber>> {
        let pid = context.pid();
        let fiber = Arc::new(Fiber::new());
        let entry = context.take_entry();
        let baton = Arc::clone(&fiber);
        let hooks = Arc::clone(hooks);

        let spawned = thread::Builder::new()
            .name(format!("fiber-{}", pid))
            .spawn(move || run_fiber(pid, baton, entry, hooks));

        match spawned {
            Ok(_) => {
                debug!(pid, "fiber launched");
                self.fibers.insert(pid, Arc::clone(&fiber));
                Some(fiber)
            }
            Err(e) => {
                error!(pid, error = %e, "failed to launch fiber");
                None
            }
        }
    }
}

fn run_fiber(pid: Pid, baton: Arc<Fiber>, entry: Option<EntryFn>, hooks: Arc<dyn SwitchHooks>) {
    if baton.wait() == Signal::Retire {
        return;
    }
    hooks.resumed();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if let Some(entry) = entry {
            entry();
        }
        // Switches away for good; only returns by unwinding once retired
        hooks.finished();
    }));

    if let Err(payload) = outcome {
        if payload.is::<Retired>() {
            debug!(pid, "fiber retired");
        } else {
            panic::resume_unwind(payload);
        }
    }
}

impl ContextSwitch for FiberSwitch {
    fn switch(&self, from: Option<&Context>, to: &Context, hooks: &Arc<dyn SwitchHooks>) {
        let target = match self.fibers.get(&to.pid()).map(|f| Arc::clone(f.value())) {
            Some(fiber) => fiber,
            None => match self.launch(to, hooks) {
                Some(fiber) => fiber,
                None => {
                    // Nothing can take the baton; the caller keeps running
                    hooks.resumed();
                    return;
                }
            },
        };

        let Some(from) = from else {
            target.send(Signal::Resume);
            return;
        };

        // Registered before the baton moves so a quick switch back finds it
        let own = self.fiber_for(from.pid());
        target.send(Signal::Resume);

        match own.wait() {
            Signal::Retire => panic::resume_unwind(Box::new(Retired)),
            _ => hooks.resumed(),
        }
    }

    fn retire(&self, context: &Context) {
        if let Some((_, fiber)) = self.fibers.remove(&context.pid()) {
            fiber.send(Signal::Retire);
        }
    }

    fn name(&self) -> &'static str {
        "fiber"
    }
}
