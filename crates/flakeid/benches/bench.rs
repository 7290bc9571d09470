use core::hint::black_box;
use core::time::Duration;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use flakeid::{
    AtomicSnowflakeGenerator, GeneratorConfig, IdGenStatus, LockSnowflakeGenerator,
    MonotonicClock, SnowflakeGenerator, TimeSource,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (split across threads for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

/// A layout whose sequence never runs out within one iteration on a frozen
/// clock.
fn mock_config() -> GeneratorConfig {
    GeneratorConfig::default()
        .with_epoch(Duration::ZERO)
        .with_bits(2, 2, 20)
}

/// Benchmarks a hot-path generator where IDs are always `Ready`.
fn bench_generator<G, T>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    match generator.try_poll_id() {
                        Ok(IdGenStatus::Ready { id }) => {
                            black_box(id);
                        }
                        _ => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks the blocking path against a real clock, where exhausting a
/// millisecond means waiting for the next one.
fn bench_generator_blocking<G, T>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> G,
) where
    G: SnowflakeGenerator<T>,
    T: TimeSource,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.generate().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks one generator shared across threads.
fn bench_generator_contended<G, T>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> G,
) where
    G: SnowflakeGenerator<T> + Send + Sync,
    T: TimeSource,
{
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;
        group.throughput(Throughput::Elements(TOTAL_IDS as u64));

        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    let generator = Arc::new(generator_factory());
                    let barrier = Arc::new(Barrier::new(thread_count + 1));

                    scope(|s| {
                        for _ in 0..thread_count {
                            let generator = Arc::clone(&generator);
                            let barrier = Arc::clone(&barrier);
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..ids_per_thread {
                                    black_box(generator.generate().unwrap());
                                }
                            });
                        }
                        barrier.wait();
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

fn benchmark_mock_sequential_lock(c: &mut Criterion) {
    bench_generator(c, "mock/sequential/lock", || {
        LockSnowflakeGenerator::new(mock_config(), FixedMockTime { millis: 1 }).unwrap()
    });
}

fn benchmark_mock_sequential_atomic(c: &mut Criterion) {
    bench_generator(c, "mock/sequential/atomic", || {
        AtomicSnowflakeGenerator::new(mock_config(), FixedMockTime { millis: 1 }).unwrap()
    });
}

fn benchmark_mock_contended_lock(c: &mut Criterion) {
    bench_generator_contended(c, "mock/contended/lock", || {
        LockSnowflakeGenerator::new(mock_config(), FixedMockTime { millis: 1 }).unwrap()
    });
}

fn benchmark_mock_contended_atomic(c: &mut Criterion) {
    bench_generator_contended(c, "mock/contended/atomic", || {
        AtomicSnowflakeGenerator::new(mock_config(), FixedMockTime { millis: 1 }).unwrap()
    });
}

fn benchmark_mono_sequential_lock(c: &mut Criterion) {
    let clock = MonotonicClock::default();
    bench_generator_blocking(c, "mono/sequential/lock", || {
        LockSnowflakeGenerator::new(GeneratorConfig::default(), clock.clone()).unwrap()
    });
}

fn benchmark_mono_sequential_atomic(c: &mut Criterion) {
    let clock = MonotonicClock::default();
    bench_generator_blocking(c, "mono/sequential/atomic", || {
        AtomicSnowflakeGenerator::new(GeneratorConfig::default(), clock.clone()).unwrap()
    });
}

fn benchmark_mono_threaded_lock(c: &mut Criterion) {
    let clock = MonotonicClock::default();
    bench_generator_contended(c, "mono/threaded/lock", || {
        LockSnowflakeGenerator::new(GeneratorConfig::default(), clock.clone()).unwrap()
    });
}

fn benchmark_mono_threaded_atomic(c: &mut Criterion) {
    let clock = MonotonicClock::default();
    bench_generator_contended(c, "mono/threaded/atomic", || {
        AtomicSnowflakeGenerator::new(GeneratorConfig::default(), clock.clone()).unwrap()
    });
}

criterion_group!(
    benches,
    benchmark_mock_sequential_lock,
    benchmark_mock_sequential_atomic,
    benchmark_mock_contended_lock,
    benchmark_mock_contended_atomic,
    benchmark_mono_sequential_lock,
    benchmark_mono_sequential_atomic,
    benchmark_mono_threaded_lock,
    benchmark_mono_threaded_atomic,
);
criterion_main!(benches);
