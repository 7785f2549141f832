//! # Worker Pool Benchmarks
//!
//! Dispatch overhead of the bounded pool for tiny tasks.
//!
//! Run with: `cargo bench --bench worker_pool`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use workgate::{SaturationPolicy, WorkerPoolBuilder};

const TASKS: usize = 10_000;

/// Submit-and-drain throughput for different pool sizes
fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_throughput");
    group.throughput(Throughput::Elements(TASKS as u64));

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_workers", workers)),
            &workers,
            |b, &workers| {
                let pool = WorkerPoolBuilder::new()
                    .core_pool_size(workers)
                    .maximum_pool_size(workers)
                    .queue_capacity(1024)
                    .saturation(SaturationPolicy::Block)
                    .build()
                    .unwrap();

                b.iter_custom(|iters| {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let (tx, rx) = mpsc::channel();
                        let start = Instant::now();
                        for _ in 0..TASKS {
                            let tx = tx.clone();
                            pool.submit(move || tx.send(()).unwrap()).unwrap();
                        }
                        for _ in 0..TASKS {
                            rx.recv().unwrap();
                        }
                        total += start.elapsed();
                    }
                    total
                });
            },
        );
    }

    group.finish();
}

/// Many submitters, small queue: exercises the blocking path
fn bench_contended_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_submit");

    for submitters in [2usize, 8] {
        group.throughput(Throughput::Elements((submitters * 1000) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_submitters", submitters)),
            &submitters,
            |b, &submitters| {
                let pool = Arc::new(
                    WorkerPoolBuilder::new()
                        .core_pool_size(2)
                        .maximum_pool_size(4)
                        .keep_alive(Duration::from_millis(50))
                        .queue_capacity(8)
                        .saturation(SaturationPolicy::Block)
                        .build()
                        .unwrap(),
                );

                b.iter_custom(|iters| {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let done = Arc::new(AtomicUsize::new(0));
                        let start = Instant::now();

                        let handles: Vec<_> = (0..submitters)
                            .map(|_| {
                                let pool = pool.clone();
                                let done = done.clone();
                                thread::spawn(move || {
                                    for _ in 0..1000 {
                                        let done = done.clone();
                                        pool.submit(move || {
                                            done.fetch_add(1, Ordering::Relaxed);
                                        })
                                        .unwrap();
                                    }
                                })
                            })
                            .collect();
                        for handle in handles {
                            handle.join().unwrap();
                        }
                        while done.load(Ordering::Relaxed) < submitters * 1000 {
                            thread::yield_now();
                        }

                        total += start.elapsed();
                    }
                    total
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_throughput, bench_contended_submit);
criterion_main!(benches);
