/*!
 * Scheduler Benchmarks
 *
 * Dispatch cost under the trace switch, timer-tick overhead and lock latency
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use edu_os_kernel::{
    AgingPriority, ProcessFactory, ProcessScheduler, SchedulerConfig, Spinlock, StrictPriority,
};
use std::sync::Arc;

fn started_scheduler(pattern_aging: bool, processes: usize) -> Arc<ProcessScheduler> {
    let builder = ProcessScheduler::builder()
        .with_config(SchedulerConfig::default().with_queue_capacity(processes.max(1) + 1));
    let scheduler = if pattern_aging {
        builder.with_pattern(AgingPriority::default()).build().unwrap()
    } else {
        builder.with_pattern(StrictPriority::default()).build().unwrap()
    };

    let factory = ProcessFactory::new();
    for i in 0..processes {
        scheduler
            .ready(&factory.create("bench", (i % 5) as u8))
            .unwrap();
    }
    scheduler.set_initialized();
    scheduler.start().unwrap();
    scheduler
}

fn bench_yield(c: &mut Criterion) {
    let mut group = c.benchmark_group("yield_now");

    for processes in [1, 16, 256] {
        group.bench_with_input(
            BenchmarkId::from_parameter(processes),
            &processes,
            |b, &processes| {
                let scheduler = started_scheduler(false, processes);
                b.iter(|| scheduler.yield_now().unwrap());
            },
        );
    }

    group.finish();
}

fn bench_timer_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("timer_tick");

    for (name, aging) in [("strict", false), ("aging", true)] {
        group.bench_function(BenchmarkId::new("preempting", name), |b| {
            let scheduler = started_scheduler(aging, 64);
            let slice = scheduler.config().time_slice_ms;
            let mut now = 0;
            b.iter(|| {
                now += slice;
                scheduler.on_timer_interrupt(black_box(now));
            });
        });
    }

    group.bench_function("within_slice", |b| {
        let scheduler = started_scheduler(false, 64);
        b.iter(|| scheduler.on_timer_interrupt(black_box(1)));
    });

    group.finish();
}

fn bench_spinlock(c: &mut Criterion) {
    let lock = Spinlock::new();

    c.bench_function("spinlock_uncontended", |b| {
        b.iter(|| {
            lock.acquire();
            lock.release();
        });
    });

    c.bench_function("spinlock_try_acquire_held", |b| {
        lock.acquire();
        b.iter(|| black_box(lock.try_acquire()));
        lock.release();
    });
}

criterion_group!(benches, bench_yield, bench_timer_tick, bench_spinlock);

criterion_main!(benches);
