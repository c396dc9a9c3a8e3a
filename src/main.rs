/*!
 * Educational OS Kernel - Main Entry Point
 *
 * Boots a simulated single-CPU kernel:
 * - Priority scheduler with a tracing context switch
 * - Periodic timer interrupts from a background task
 * - A short workload of yields, priority changes, blocking and kills
 */

use edu_os_kernel::core::limits::DEFAULT_TIMER_INTERVAL_MS;
use edu_os_kernel::{
    init_tracing, install, AgingPriority, ProcessFactory, ProcessScheduler, SchedulerConfig,
    TimeProvider, TimerTask, TraceSwitch,
};
use miette::IntoDiagnostic;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const WORKLOAD_ROUNDS: usize = 50;

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    info!("Kernel starting...");
    info!("================================================");

    let config = SchedulerConfig::from_env()?;
    info!(
        "Scheduler config: {}ms slice, {} entries per queue",
        config.time_slice_ms, config.queue_capacity
    );

    let switch = Arc::new(TraceSwitch::new());
    let scheduler = ProcessScheduler::builder()
        .with_pattern(AgingPriority::default())
        .with_config(config)
        .with_switch(switch.clone())
        .build()?;
    let scheduler = install(scheduler)?;

    info!("Creating boot processes...");
    let factory = ProcessFactory::new();
    let init = factory.create("init", 0);
    let shell = factory.create("shell", 1);
    let logger = factory.create("logger", 2);
    let batch = factory.create("batch", 3);
    for process in [&init, &shell, &logger, &batch] {
        scheduler.ready(process)?;
    }
    factory.spawn_thread(&shell, "reader");

    scheduler.set_initialized();
    scheduler.start()?;
    info!("Scheduler started with process {}", scheduler.current_process().pid());

    let provider = Arc::new(TimeProvider::new(scheduler.clone()));
    let timer = TimerTask::spawn(Arc::clone(&provider), DEFAULT_TIMER_INTERVAL_MS);

    for round in 0..WORKLOAD_ROUNDS {
        tokio::time::sleep(Duration::from_millis(2)).await;

        match round {
            10 => {
                let old = scheduler.change_priority(&batch, 1)?;
                info!("batch promoted from priority {}", old);
            }
            20 if scheduler.current_process().pid() == logger.pid() => {
                scheduler.block()?;
                info!("logger blocked waiting for input");
            }
            30 => {
                if scheduler.ready(&logger).is_ok() {
                    info!("logger woken");
                }
            }
            40 => {
                scheduler.kill(&shell)?;
                info!("shell killed");
            }
            _ => scheduler.yield_now()?,
        }
    }

    timer.shutdown().await;
    scheduler.reap();

    info!("================================================");
    info!(
        "Ran {} context switches over {}ms; {} processes alive",
        switch.len(),
        provider.now(),
        scheduler.process_count()
    );

    let stats = serde_json::to_string_pretty(&scheduler.stats()).into_diagnostic()?;
    println!("{}", stats);
    let processes = serde_json::to_string_pretty(&scheduler.processes()).into_diagnostic()?;
    println!("{}", processes);

    Ok(())
}
