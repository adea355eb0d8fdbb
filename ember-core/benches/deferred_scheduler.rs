#![allow(missing_docs)]
//! Benchmarks for the deferred scheduler tick pass.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ember_core::ticks::DeferredScheduler;

/// Fills a scheduler with `count` tasks spread over 20 ticks of delay.
fn filled_scheduler(count: usize) -> DeferredScheduler {
    let scheduler = DeferredScheduler::new(u32::MAX, usize::MAX);
    for i in 0..count {
        let delay = (i % 20) as i32;
        let _ = scheduler.schedule_delayed(
            move || {
                black_box(i);
            },
            delay,
        );
    }
    scheduler
}

fn bench_schedule(c: &mut Criterion) {
    c.bench_function("schedule_next_tick", |b| {
        let scheduler = DeferredScheduler::new(u32::MAX, usize::MAX);
        b.iter(|| {
            let _ = scheduler.schedule_next_tick(|| {});
            // Keep the queue from growing across iterations
            if scheduler.len() > 10_000 {
                scheduler.discard_pending();
            }
        });
    });
}

fn bench_tick_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_pass");

    for count in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("pending", count), &count, |b, &count| {
            b.iter_batched(
                || filled_scheduler(count),
                |scheduler| {
                    // Drain the whole queue
                    for _ in 0..20 {
                        black_box(scheduler.on_tick());
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_schedule, bench_tick_pass);
criterion_main!(benches);
