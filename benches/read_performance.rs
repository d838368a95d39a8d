//! Performance benchmarks for hotswap-reload.
//!
//! These cover the read paths that sit on request hot paths:
//! - Raw `load()` of the current bytes
//! - Typed `load_config()` when the cache is warm
//! - Reads while refreshes publish new data

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hotswap_reload::prelude::*;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct BenchConfig {
    value: i32,
    name: String,
    flag: bool,
    items: Vec<String>,
}

const BENCH_JSON: &str = r#"{"value": 42, "name": "benchmark", "flag": true, "items": ["a", "b", "c"]}"#;

fn local_reloader(runtime: &tokio::runtime::Runtime, path: &Path) -> Reloader {
    std::fs::write(path, BENCH_JSON).unwrap();
    runtime
        .block_on(Reloader::builder().with_local_file(path).build())
        .unwrap()
}

/// Benchmark single-threaded raw and typed read latency
fn benchmark_read_latency(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let reloader = local_reloader(&runtime, &temp_dir.path().join("bench.json"));
    let typed = TypedReloader::<BenchConfig>::new(reloader.clone());
    typed.load_config().unwrap();

    let mut group = c.benchmark_group("read_latency");
    group.bench_function("raw_load", |b| {
        b.iter(|| {
            let data = reloader.load();
            black_box(data.len());
        });
    });
    group.bench_function("typed_cached", |b| {
        b.iter(|| {
            let cfg = typed.load_config().unwrap();
            black_box(cfg.value);
        });
    });
    group.finish();
}

/// Benchmark decode cost when the cache is cold
fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for format in [ConfigFormat::Json, ConfigFormat::Yaml, ConfigFormat::Auto] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{format:?}")),
            &format,
            |b, &format| {
                b.iter(|| {
                    let cfg: BenchConfig =
                        hotswap_reload::core::decode(BENCH_JSON.as_bytes(), format, false).unwrap();
                    black_box(cfg.value);
                });
            },
        );
    }
    group.finish();
}

/// Benchmark concurrent typed reads with varying thread counts
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let reloader = local_reloader(&runtime, &temp_dir.path().join("bench.json"));

    let mut group = c.benchmark_group("concurrent_reads");

    for num_threads in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{num_threads}_threads")),
            &num_threads,
            |b, &num_threads| {
                let typed = TypedReloader::<BenchConfig>::new(reloader.clone());
                let barrier = Arc::new(Barrier::new(num_threads + 1));

                b.iter_custom(|iters| {
                    let mut handles = vec![];

                    for _ in 0..num_threads {
                        let cfg = typed.clone();
                        let b = Arc::clone(&barrier);

                        handles.push(thread::spawn(move || {
                            b.wait();

                            let start = std::time::Instant::now();
                            for _ in 0..iters {
                                let data = cfg.load_config().unwrap();
                                black_box(data.value);
                            }
                            start.elapsed()
                        }));
                    }

                    barrier.wait();

                    let total_duration: Duration =
                        handles.into_iter().map(|h| h.join().unwrap()).sum();
                    total_duration / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reload under load: readers never block on a refresh
fn benchmark_reload_under_load(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("reload_under_load");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("reload_with_16_readers", |b| {
        b.iter_custom(|iters| {
            runtime.block_on(async move {
                let temp_dir = TempDir::new().unwrap();
                let path = temp_dir.path().join("bench.json");
                std::fs::write(&path, BENCH_JSON).unwrap();
                let reloader = Reloader::builder().with_local_file(&path).build().await.unwrap();
                let typed = TypedReloader::<BenchConfig>::new(reloader.clone());

                let keep_running = Arc::new(AtomicBool::new(true));
                let reads_completed = Arc::new(AtomicUsize::new(0));

                let mut reader_handles = vec![];
                for _ in 0..16 {
                    let cfg = typed.clone();
                    let running = Arc::clone(&keep_running);
                    let counter = Arc::clone(&reads_completed);

                    reader_handles.push(tokio::spawn(async move {
                        while running.load(Ordering::Relaxed) {
                            let data = cfg.load_config().unwrap();
                            black_box(data.value);
                            counter.fetch_add(1, Ordering::Relaxed);
                            tokio::task::yield_now().await;
                        }
                    }));
                }

                let start = std::time::Instant::now();
                for i in 0..iters {
                    let body = format!(
                        r#"{{"value": {i}, "name": "reload_{i}", "flag": {}, "items": ["x"]}}"#,
                        i % 2 == 0
                    );
                    std::fs::write(&path, body).unwrap();
                    reloader.reload().await.unwrap();
                }
                let duration = start.elapsed();

                keep_running.store(false, Ordering::Relaxed);
                for handle in reader_handles {
                    handle.await.unwrap();
                }

                let total_reads = reads_completed.load(Ordering::Relaxed);
                println!("  Completed {total_reads} reads during {iters} reloads");

                reloader.close().unwrap();
                duration
            })
        });
    });

    group.finish();
}

/// Benchmark comparison with lock-based snapshots
fn benchmark_lock_comparison(c: &mut Criterion) {
    use std::sync::Mutex;

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let reloader = local_reloader(&runtime, &temp_dir.path().join("bench.json"));

    let mut group = c.benchmark_group("lock_comparison");

    group.bench_function("arcswap_load", |b| {
        b.iter(|| black_box(reloader.load()));
    });

    let mutex = Mutex::new(bytes::Bytes::from_static(BENCH_JSON.as_bytes()));
    group.bench_function("mutex_load", |b| {
        b.iter(|| black_box(mutex.lock().unwrap().clone()));
    });

    let rwlock = std::sync::RwLock::new(bytes::Bytes::from_static(BENCH_JSON.as_bytes()));
    group.bench_function("rwlock_load", |b| {
        b.iter(|| black_box(rwlock.read().unwrap().clone()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_latency,
    benchmark_decode,
    benchmark_concurrent_reads,
    benchmark_reload_under_load,
    benchmark_lock_comparison,
);

criterion_main!(benches);
