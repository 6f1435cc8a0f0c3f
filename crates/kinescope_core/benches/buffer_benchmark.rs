//! # Frame Buffer Benchmark
//!
//! Hot-path cost of the bounded buffer monitor: the enqueue/pop pair a
//! RealTime frame pays on top of rendering, and the policy decision
//! every reported frame pays.
//!
//! Run with: `cargo bench --package kinescope_core`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use kinescope_core::{Frame, FrameBuffer, ScheduleState};

/// Benchmark: uncontended enqueue/pop round trip.
fn bench_enqueue_pop(c: &mut Criterion) {
    let buffer: FrameBuffer<f64> = FrameBuffer::new(64);
    let mut group = c.benchmark_group("frame_buffer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("enqueue_pop", |b| {
        let mut sim_time = 0.0;
        b.iter(|| {
            sim_time += 0.01;
            buffer.enqueue(Frame::capture(&sim_time)).unwrap();
            black_box(buffer.pop());
        });
    });
    group.finish();
}

/// Benchmark: per-report policy decision in each mode.
fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_decide");
    group.throughput(Throughput::Elements(1));

    for mode in ["pass_through", "sampling", "real_time"] {
        group.bench_function(mode, |b| {
            let mut state = ScheduleState::new();
            match mode {
                "sampling" => state.set_mode(kinescope_core::Mode::Sampling),
                "real_time" => state.set_mode(kinescope_core::Mode::RealTime),
                _ => {}
            }
            let now = Instant::now();
            let mut sim_time = 0.0;
            b.iter(|| {
                sim_time += 0.01;
                black_box(state.decide(sim_time, now))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enqueue_pop, bench_decide);
criterion_main!(benches);
