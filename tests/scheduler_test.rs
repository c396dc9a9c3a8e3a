/*!
 * Scheduler Tests
 * Dispatch order, preemption, blocking, termination and priority changes
 */

use edu_os_kernel::{
    AgingPriority, Pid, Process, ProcessFactory, ProcessScheduler, ProcessState, SchedulerConfig,
    SchedulerError, StrictPriority, TraceSwitch, IDLE_PID,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

fn new_scheduler(config: SchedulerConfig) -> (Arc<ProcessScheduler>, Arc<TraceSwitch>) {
    let switch = Arc::new(TraceSwitch::new());
    let scheduler = ProcessScheduler::builder()
        .with_pattern(StrictPriority::new(5).unwrap())
        .with_config(config)
        .with_switch(switch.clone())
        .build()
        .unwrap();
    (scheduler, switch)
}

fn started(processes: &[&Arc<Process>]) -> (Arc<ProcessScheduler>, Arc<TraceSwitch>) {
    let (scheduler, switch) = new_scheduler(SchedulerConfig::default());
    for process in processes {
        scheduler.ready(process).unwrap();
    }
    scheduler.set_initialized();
    scheduler.start().unwrap();
    (scheduler, switch)
}

fn current_pid(scheduler: &ProcessScheduler) -> Pid {
    scheduler.current_process().pid()
}

#[test]
fn test_highest_priority_selected() {
    let factory = ProcessFactory::new();
    let low = factory.create("low", 2);
    let high = factory.create("high", 0);
    let mid = factory.create("mid", 1);

    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    for process in [&low, &high, &mid] {
        scheduler.ready(process).unwrap();
    }

    assert_eq!(scheduler.next_process().pid(), high.pid());
    // Peeking does not consume
    assert_eq!(scheduler.next_process().pid(), high.pid());
    assert_eq!(scheduler.queued_pids(0), vec![high.pid()]);
    assert!(scheduler.is_process_waiting());
}

#[test]
fn test_equal_priority_round_robin() {
    let factory = ProcessFactory::new();
    let a = factory.create("a", 1);
    let b = factory.create("b", 1);
    let c = factory.create("c", 1);

    let (scheduler, switch) = started(&[&a, &b, &c]);
    scheduler.yield_now().unwrap();
    scheduler.yield_now().unwrap();
    scheduler.yield_now().unwrap();

    assert_eq!(
        switch.dispatch_order(),
        vec![a.pid(), b.pid(), c.pid(), a.pid()]
    );
    assert_eq!(scheduler.queued_pids(1), vec![b.pid(), c.pid()]);
}

#[test]
fn test_start_then_yield_redispatches_highest() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);

    let (scheduler, switch) = started(&[&p1, &p2]);
    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(p1.state(), ProcessState::Running);

    scheduler.yield_now().unwrap();
    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(p2.state(), ProcessState::Ready);

    // Only the boot transition switched contexts
    assert_eq!(switch.len(), 1);
    assert_eq!(switch.last().unwrap().from, None);
    let stats = scheduler.stats();
    assert_eq!(stats.dispatches, 2);
    assert_eq!(stats.context_switches, 1);
    assert!(!scheduler.lock().is_locked());
}

#[test]
fn test_block_dispatches_next_and_ready_wakes() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);

    let (scheduler, _) = started(&[&p1, &p2]);
    scheduler.block().unwrap();

    assert_eq!(current_pid(&scheduler), p2.pid());
    assert_eq!(p1.state(), ProcessState::Blocked);
    assert_eq!(scheduler.process_count(), 1);
    assert!(!scheduler.is_process_waiting());

    scheduler.ready(&p1).unwrap();
    assert_eq!(scheduler.next_process().pid(), p1.pid());
    scheduler.yield_now().unwrap();
    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(scheduler.queued_pids(1), vec![p2.pid()]);
}

#[test]
fn test_idle_when_nothing_ready() {
    let (scheduler, switch) = started(&[]);
    assert_eq!(current_pid(&scheduler), IDLE_PID);
    assert_eq!(switch.dispatch_order(), vec![IDLE_PID]);
    assert_eq!(scheduler.process_count(), 0);
    assert_eq!(scheduler.thread_count(), 0);
    assert_eq!(scheduler.block(), Err(SchedulerError::IdleProcess));

    let (counting, _) = new_scheduler(SchedulerConfig::default().with_count_idle(true));
    assert_eq!(counting.process_count(), 1);
}

#[test]
fn test_idle_yields_to_newly_ready() {
    let (scheduler, switch) = started(&[]);
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 3);

    scheduler.ready(&p1).unwrap();
    scheduler.yield_now().unwrap();

    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(switch.last().unwrap().from, Some(IDLE_PID));
    assert_eq!(scheduler.idle_process().state(), ProcessState::Ready);
}

#[test]
fn test_kill_current_dispatches_next() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);
    factory.spawn_thread(&p1, "worker").unwrap();
    assert_eq!(p1.live_thread_count(), 2);

    let (scheduler, switch) = started(&[&p1, &p2]);
    assert_eq!(scheduler.thread_count(), 3);

    scheduler.kill(&p1).unwrap();

    assert_eq!(current_pid(&scheduler), p2.pid());
    assert_eq!(p1.state(), ProcessState::Terminated);
    assert_eq!(p1.live_thread_count(), 0);
    assert_eq!(scheduler.process_count(), 1);
    assert_eq!(scheduler.thread_count(), 1);
    assert_eq!(switch.retired(), vec![p1.pid()]);

    let stats = scheduler.stats();
    assert_eq!(stats.kills, 1);
    assert_eq!(stats.released, 1);
}

#[test]
fn test_kill_queued_process() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);
    let p3 = factory.create("p3", 1);

    let (scheduler, _) = started(&[&p1, &p2, &p3]);
    scheduler.kill(&p2).unwrap();

    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(scheduler.queued_pids(1), vec![p3.pid()]);
    assert_eq!(p2.state(), ProcessState::Terminated);
    assert_eq!(
        scheduler.kill(&p2),
        Err(SchedulerError::InvalidState {
            pid: p2.pid(),
            state: ProcessState::Terminated,
        })
    );
    assert!(scheduler.ready(&p2).is_err());
}

#[test]
fn test_exit_terminates_current() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 2);

    let (scheduler, switch) = started(&[&p1]);
    scheduler.exit().unwrap();

    assert_eq!(current_pid(&scheduler), IDLE_PID);
    assert_eq!(p1.state(), ProcessState::Terminated);
    assert_eq!(switch.dispatch_order(), vec![p1.pid(), IDLE_PID]);
    assert_eq!(scheduler.exit(), Err(SchedulerError::IdleProcess));
}

#[test]
fn test_kill_idle_rejected() {
    let (scheduler, _) = started(&[]);
    let idle = Arc::clone(scheduler.idle_process());
    assert_eq!(scheduler.kill(&idle), Err(SchedulerError::IdleProcess));
    assert_eq!(scheduler.ready(&idle), Err(SchedulerError::IdleProcess));
}

#[test]
fn test_change_priority_of_idle_rejected() {
    let (scheduler, _) = started(&[]);
    let idle = Arc::clone(scheduler.idle_process());
    let before = idle.priority();

    assert_eq!(
        scheduler.change_priority(&idle, 0),
        Err(SchedulerError::IdleProcess)
    );
    assert_eq!(idle.priority(), before);
    assert_eq!(current_pid(&scheduler), IDLE_PID);
}

#[test]
fn test_change_priority_moves_once() {
    let factory = ProcessFactory::new();
    let a = factory.create("a", 0);
    let b = factory.create("b", 3);
    let c = factory.create("c", 3);

    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    for process in [&a, &b, &c] {
        scheduler.ready(process).unwrap();
    }

    assert_eq!(scheduler.change_priority(&b, 0).unwrap(), 3);
    assert_eq!(b.priority(), 0);
    assert_eq!(scheduler.queued_pids(0), vec![a.pid(), b.pid()]);
    assert_eq!(scheduler.queued_pids(3), vec![c.pid()]);
    assert_eq!(scheduler.process_count(), 3);

    // Same queue: goes to the tail
    assert_eq!(scheduler.change_priority(&a, 0).unwrap(), 0);
    assert_eq!(scheduler.queued_pids(0), vec![b.pid(), a.pid()]);
}

#[test]
fn test_change_priority_invalid_leaves_state() {
    let factory = ProcessFactory::new();
    let a = factory.create("a", 1);
    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    scheduler.ready(&a).unwrap();

    assert_eq!(
        scheduler.change_priority(&a, 10),
        Err(SchedulerError::InvalidPriority {
            priority: 10,
            max: 4,
        })
    );
    assert_eq!(a.priority(), 1);
    assert_eq!(scheduler.queued_pids(1), vec![a.pid()]);
}

#[test]
fn test_change_priority_full_target_rejected() {
    let factory = ProcessFactory::new();
    let a = factory.create("a", 0);
    let b = factory.create("b", 1);
    let (scheduler, _) = new_scheduler(SchedulerConfig::default().with_queue_capacity(1));
    scheduler.ready(&a).unwrap();
    scheduler.ready(&b).unwrap();

    assert_eq!(
        scheduler.change_priority(&b, 0),
        Err(SchedulerError::QueueFull { priority: 0 })
    );
    assert_eq!(b.priority(), 1);
    assert_eq!(scheduler.queued_pids(0), vec![a.pid()]);
    assert_eq!(scheduler.queued_pids(1), vec![b.pid()]);
}

#[test]
fn test_change_priority_of_running_applies_on_requeue() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);

    let (scheduler, _) = started(&[&p1, &p2]);
    assert_eq!(scheduler.change_priority(&p1, 2).unwrap(), 0);
    assert_eq!(current_pid(&scheduler), p1.pid());

    scheduler.yield_now().unwrap();
    assert_eq!(current_pid(&scheduler), p2.pid());
    assert_eq!(scheduler.queued_pids(2), vec![p1.pid()]);
}

#[test]
fn test_ready_queue_overflow() {
    let factory = ProcessFactory::new();
    let (scheduler, _) = new_scheduler(SchedulerConfig::default().with_queue_capacity(2));

    scheduler.ready(&factory.create("a", 1)).unwrap();
    scheduler.ready(&factory.create("b", 1)).unwrap();
    let c = factory.create("c", 1);
    assert_eq!(
        scheduler.ready(&c),
        Err(SchedulerError::QueueFull { priority: 1 })
    );
    assert_eq!(c.state(), ProcessState::Created);
    assert_eq!(scheduler.stats().rejected, 1);

    // Other levels are unaffected
    scheduler.ready(&factory.create("d", 2)).unwrap();
    assert_eq!(scheduler.process_count(), 3);
}

#[test]
fn test_ready_rejects_double_admission() {
    let factory = ProcessFactory::new();
    let a = factory.create("a", 1);
    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    scheduler.ready(&a).unwrap();

    assert_eq!(
        scheduler.ready(&a),
        Err(SchedulerError::InvalidState {
            pid: a.pid(),
            state: ProcessState::Ready,
        })
    );
    assert_eq!(scheduler.queued_pids(1), vec![a.pid()]);
}

#[test]
fn test_ready_rejects_second_process_with_queued_pid() {
    let a = Arc::new(Process::new(7, "a", 1));
    let twin = Arc::new(Process::new(7, "twin", 2));
    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    scheduler.ready(&a).unwrap();

    assert_eq!(
        scheduler.ready(&twin),
        Err(SchedulerError::InvalidState {
            pid: 7,
            state: ProcessState::Ready,
        })
    );
    assert_eq!(twin.state(), ProcessState::Created);

    // Operations on the twin never touch the queued process
    assert_eq!(scheduler.change_priority(&twin, 0).unwrap(), 2);
    scheduler.kill(&twin).unwrap();
    assert_eq!(scheduler.queued_pids(1), vec![7]);
    assert_eq!(a.state(), ProcessState::Ready);
    assert_eq!(scheduler.process_count(), 1);
}

#[test]
fn test_ready_rejects_out_of_range_priority() {
    let factory = ProcessFactory::new();
    let a = factory.create("a", 9);
    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    assert_eq!(
        scheduler.ready(&a),
        Err(SchedulerError::InvalidPriority {
            priority: 9,
            max: 4,
        })
    );
    assert!(!scheduler.is_process_waiting());
}

#[test]
fn test_start_preconditions() {
    let (scheduler, _) = new_scheduler(SchedulerConfig::default());
    assert_eq!(scheduler.start(), Err(SchedulerError::NotInitialized));
    assert_eq!(scheduler.yield_now(), Err(SchedulerError::NotStarted));
    assert_eq!(scheduler.block(), Err(SchedulerError::NotStarted));
    assert_eq!(scheduler.exit(), Err(SchedulerError::NotStarted));
    assert!(!scheduler.yield_thread_safe());

    scheduler.set_initialized();
    assert!(scheduler.is_initialized());
    scheduler.start().unwrap();
    assert!(scheduler.is_started());
    assert_eq!(scheduler.start(), Err(SchedulerError::AlreadyStarted));
}

#[test]
fn test_timer_preempts_after_time_slice() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 0);

    let (scheduler, _) = started(&[&p1, &p2]);
    assert_eq!(scheduler.config().time_slice_ms, 10);

    scheduler.on_timer_interrupt(5);
    assert_eq!(current_pid(&scheduler), p1.pid());

    scheduler.on_timer_interrupt(10);
    assert_eq!(current_pid(&scheduler), p2.pid());
    assert_eq!(scheduler.queued_pids(0), vec![p1.pid()]);
    assert_eq!(scheduler.last_timestamp_ms(), 10);

    scheduler.on_timer_interrupt(19);
    assert_eq!(current_pid(&scheduler), p2.pid());
    scheduler.on_timer_interrupt(20);
    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(scheduler.stats().preemptions, 2);
}

#[test]
fn test_timer_ignored_until_initialized_and_started() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let (scheduler, switch) = new_scheduler(SchedulerConfig::default());
    scheduler.ready(&p1).unwrap();

    scheduler.on_timer_interrupt(100);
    scheduler.set_initialized();
    scheduler.on_timer_interrupt(200);

    assert!(switch.is_empty());
    assert_eq!(current_pid(&scheduler), IDLE_PID);
    assert_eq!(scheduler.stats().preemptions, 0);
}

#[test]
fn test_timer_skips_tick_when_lock_held() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 0);
    let (scheduler, _) = started(&[&p1, &p2]);

    scheduler.lock().acquire();
    scheduler.on_timer_interrupt(1_000);
    assert!(scheduler.lock().is_locked());
    scheduler.lock().release();

    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(scheduler.stats().skipped_ticks, 1);

    // Retried on the next tick
    scheduler.on_timer_interrupt(1_001);
    assert_eq!(current_pid(&scheduler), p2.pid());
}

#[test]
fn test_deferred_yield_honored_by_next_tick() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 0);
    let (scheduler, _) = started(&[&p1, &p2]);

    scheduler.lock().acquire();
    assert!(!scheduler.yield_thread_safe());
    scheduler.lock().release();
    assert_eq!(scheduler.stats().deferred_yields, 1);
    assert_eq!(current_pid(&scheduler), p1.pid());

    // Well inside the slice, but the pending yield forces a reschedule
    scheduler.on_timer_interrupt(1);
    assert_eq!(current_pid(&scheduler), p2.pid());

    // Consumed: the next early tick does nothing
    scheduler.on_timer_interrupt(2);
    assert_eq!(current_pid(&scheduler), p2.pid());
}

#[test]
fn test_yield_thread_safe_uncontended() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 0);
    let (scheduler, _) = started(&[&p1, &p2]);

    assert!(scheduler.yield_thread_safe());
    assert_eq!(current_pid(&scheduler), p2.pid());
    assert!(!scheduler.lock().is_locked());
}

#[test]
fn test_strict_priority_starves_lower_queue() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);
    let (scheduler, _) = started(&[&p1, &p2]);

    for tick in 1..=5 {
        scheduler.on_timer_interrupt(tick * 10);
        assert_eq!(current_pid(&scheduler), p1.pid());
    }
    assert_eq!(p2.dispatches(), 0);
}

#[test]
fn test_aging_serves_lower_queue() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);

    let switch = Arc::new(TraceSwitch::new());
    let scheduler = ProcessScheduler::builder()
        .with_pattern(AgingPriority::new(3, 1).unwrap())
        .with_switch(switch.clone())
        .build()
        .unwrap();
    scheduler.ready(&p1).unwrap();
    scheduler.ready(&p2).unwrap();
    scheduler.set_initialized();
    scheduler.start().unwrap();

    // One full slice drifts p1 behind p2
    scheduler.on_timer_interrupt(10);
    assert_eq!(current_pid(&scheduler), p2.pid());
    assert_eq!(scheduler.queued_pids(1), vec![p1.pid()]);

    scheduler.on_timer_interrupt(20);
    assert_eq!(current_pid(&scheduler), p1.pid());

    // Re-admission after blocking resets the drift
    scheduler.block().unwrap();
    scheduler.ready(&p1).unwrap();
    assert_eq!(scheduler.queued_pids(0), vec![p1.pid()]);
}

#[test]
fn test_aging_serves_lower_queue_when_high_yields() {
    let factory = ProcessFactory::new();
    let high = factory.create("high", 0);
    let low = factory.create("low", 4);

    let scheduler = ProcessScheduler::builder()
        .with_pattern(AgingPriority::new(5, 2).unwrap())
        .build()
        .unwrap();
    scheduler.ready(&high).unwrap();
    scheduler.ready(&low).unwrap();
    scheduler.set_initialized();
    scheduler.start().unwrap();

    // Yields well inside its slice; no timer tick ever fires
    let mut yields = 0;
    while low.dispatches() == 0 && yields < 100 {
        assert_eq!(current_pid(&scheduler), high.pid());
        scheduler.yield_now().unwrap();
        yields += 1;
    }

    assert_eq!(low.dispatches(), 1);
    assert_eq!(current_pid(&scheduler), low.pid());
    // Two requeues per level over four levels
    assert_eq!(yields, 8);
    assert_eq!(scheduler.stats().preemptions, 0);
}

#[test]
fn test_process_stats_snapshot() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 1);
    let (scheduler, _) = started(&[&p1, &p2]);

    let processes = scheduler.processes();
    assert_eq!(processes.len(), 2);
    assert_eq!(processes[0].pid, p1.pid());
    assert!(processes[0].is_current);
    assert_eq!(processes[0].state, ProcessState::Running);
    assert_eq!(processes[1].name, "p2");
    assert!(!processes[1].is_current);

    let json = serde_json::to_string(&scheduler.stats()).unwrap();
    assert!(json.contains("\"pattern\":\"strict\""));
}

#[test]
fn test_concurrent_ready_with_timer() {
    const WORKERS: usize = 4;
    const PER_WORKER: usize = 50;

    let factory = ProcessFactory::new();
    let (scheduler, _) = new_scheduler(SchedulerConfig::default().with_queue_capacity(1_000));
    scheduler.set_initialized();
    scheduler.start().unwrap();

    let processes: Vec<Arc<Process>> = (0..WORKERS * PER_WORKER)
        .map(|i| factory.create("worker", (i % 5) as u8))
        .collect();

    let timer = {
        let scheduler = Arc::clone(&scheduler);
        thread::spawn(move || {
            for tick in 1..=500 {
                scheduler.on_timer_interrupt(tick * 10);
            }
        })
    };

    let handles: Vec<_> = processes
        .chunks(PER_WORKER)
        .map(|chunk| {
            let scheduler = Arc::clone(&scheduler);
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                for process in &chunk {
                    scheduler.ready(process).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    timer.join().unwrap();

    assert_eq!(scheduler.process_count(), WORKERS * PER_WORKER);

    let mut seen: Vec<Pid> = (0..5).flat_map(|level| scheduler.queued_pids(level)).collect();
    let current = current_pid(&scheduler);
    if current != IDLE_PID {
        seen.push(current);
    }
    seen.sort_unstable();
    let mut expected: Vec<Pid> = processes.iter().map(|p| p.pid()).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
    assert!(!scheduler.lock().is_locked());
}

#[test]
fn test_preempted_process_keeps_cpu_when_queue_full() {
    let factory = ProcessFactory::new();
    let p1 = factory.create("p1", 0);
    let p2 = factory.create("p2", 0);

    let (scheduler, switch) = new_scheduler(SchedulerConfig::default().with_queue_capacity(1));
    scheduler.ready(&p1).unwrap();
    scheduler.set_initialized();
    scheduler.start().unwrap();
    scheduler.ready(&p2).unwrap();

    scheduler.on_timer_interrupt(10);

    assert_eq!(current_pid(&scheduler), p1.pid());
    assert_eq!(p1.state(), ProcessState::Running);
    assert_eq!(scheduler.queued_pids(0), vec![p2.pid()]);
    assert_eq!(scheduler.stats().rejected, 1);
    assert_eq!(switch.len(), 1);
    assert!(!scheduler.lock().is_locked());
}
