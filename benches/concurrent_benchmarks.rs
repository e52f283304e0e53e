//! Concurrent Cache Benchmarks
//!
//! Benchmarks for measuring the two-tier manager under contention, across
//! read-heavy, write-heavy and admission-heavy access patterns.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lruk_cache::config::CacheManagerConfig;
use lruk_cache::CacheManager;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const CACHE_SIZE: usize = 10_000;
const OPS_PER_THREAD: usize = 1_000;
const WINDOW: Duration = Duration::from_secs(3600);

type Cache = CacheManager<usize, usize>;

fn make_cache(k: usize) -> Arc<Cache> {
    let config = CacheManagerConfig::new(CACHE_SIZE * 4, k, WINDOW, CACHE_SIZE, WINDOW)
        .unwrap()
        .with_pending_timeout(Duration::ZERO);
    Arc::new(CacheManager::init(config, None))
}

fn populated_cache() -> Arc<Cache> {
    let cache = make_cache(1);
    for key in 0..CACHE_SIZE {
        cache.get(&key);
        cache.get(&key);
        cache.put(&key, key);
    }
    cache
}

/// Benchmark concurrent reads of a filled cache tier
fn concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Reads");
    group.throughput(Throughput::Elements((8 * OPS_PER_THREAD) as u64));

    let cache = populated_cache();
    group.bench_function("LRU-K", |b| {
        b.iter(|| run_concurrent_reads(Arc::clone(&cache), 8, OPS_PER_THREAD));
    });

    group.finish();
}

/// Benchmark concurrent puts to promoted keys
fn concurrent_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Writes");
    group.throughput(Throughput::Elements((8 * OPS_PER_THREAD) as u64));

    let cache = populated_cache();
    group.bench_function("LRU-K", |b| {
        b.iter(|| run_concurrent_writes(Arc::clone(&cache), 8, OPS_PER_THREAD));
    });

    group.finish();
}

/// Benchmark the cache-aside loop: get, and put on a miss
fn concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Mixed");
    group.throughput(Throughput::Elements((8 * OPS_PER_THREAD) as u64));

    for k in [1usize, 2, 4] {
        let cache = make_cache(k);
        group.bench_with_input(BenchmarkId::new("k", k), &k, |b, _| {
            b.iter(|| run_cache_aside(Arc::clone(&cache), 8, OPS_PER_THREAD));
        });
    }

    group.finish();
}

/// Compare throughput as thread count grows
fn thread_count_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Thread Count Comparison");

    for threads in [1usize, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements((threads * OPS_PER_THREAD) as u64));
        let cache = populated_cache();
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
            b.iter(|| run_cache_aside(Arc::clone(&cache), n, OPS_PER_THREAD));
        });
    }

    group.finish();
}

fn run_concurrent_reads(cache: Arc<Cache>, num_threads: usize, ops_per_thread: usize) {
    let mut handles = Vec::with_capacity(num_threads);
    for t in 0..num_threads {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = (t * ops_per_thread + i) % CACHE_SIZE;
                black_box(cache.get(&key));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

fn run_concurrent_writes(cache: Arc<Cache>, num_threads: usize, ops_per_thread: usize) {
    let mut handles = Vec::with_capacity(num_threads);
    for t in 0..num_threads {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = (t * ops_per_thread + i) % CACHE_SIZE;
                black_box(cache.put(&key, i));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

// Keys drawn from twice the cache size, so both tiers see traffic
fn run_cache_aside(cache: Arc<Cache>, num_threads: usize, ops_per_thread: usize) {
    let mut handles = Vec::with_capacity(num_threads);
    for t in 0..num_threads {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..ops_per_thread {
                let key = (t * 7919 + i * 31) % (CACHE_SIZE * 2);
                if cache.get(&key).is_none() {
                    cache.put(&key, key);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

criterion_group!(
    benches,
    concurrent_reads,
    concurrent_writes,
    concurrent_mixed,
    thread_count_comparison
);
criterion_main!(benches);
