//! Cache-Aside Demonstration
//!
//! Drives a [`CacheManager`] the way a service would sit it in front of a
//! slow backend: read through the cache, and on a miss fetch from the
//! backend and offer the value back with `put`. Keys only earn a cache slot
//! after K+1 sightings, so one-off keys never displace the hot set.
//!
//! Run with: cargo run --example cache_aside

use lruk_cache::config::CacheManagerConfig;
use lruk_cache::metrics::CacheMetrics;
use lruk_cache::CacheManager;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const HOT_KEYS: u64 = 20;
const THREADS: u64 = 4;
const REQUESTS_PER_THREAD: u64 = 5_000;

/// Stand-in for a database: every fetch costs a little time.
struct Backend {
    fetches: AtomicU64,
}

impl Backend {
    fn fetch(&self, key: &str) -> String {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        thread::sleep(Duration::from_micros(50));
        format!("row for {key}")
    }
}

fn read_through(cache: &CacheManager<String, String>, backend: &Backend, key: &str) -> String {
    match cache.get(key) {
        Some(value) => value,
        None => {
            let value = backend.fetch(key);
            cache.put(key, value.clone());
            value
        }
    }
}

fn main() {
    println!("🚀 LRU-K Cache-Aside Demonstration");
    println!("===================================\n");

    let config = CacheManagerConfig::new(
        256,
        1,
        Duration::from_secs(10),
        HOT_KEYS as usize,
        Duration::from_secs(10),
    )
    .unwrap()
    .with_pending_timeout(Duration::from_millis(5));
    let cache = Arc::new(CacheManager::init(config, None));
    let backend = Arc::new(Backend {
        fetches: AtomicU64::new(0),
    });

    println!("📊 Workload:");
    println!("   • {THREADS} threads, {REQUESTS_PER_THREAD} requests each");
    println!("   • Every other request hits one of {HOT_KEYS} hot keys");
    println!("   • The rest are one-off scan keys\n");

    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let backend = Arc::clone(&backend);
            thread::spawn(move || {
                for i in 0..REQUESTS_PER_THREAD {
                    let key = if i % 2 == 0 {
                        format!("hot-{}", (i / 2 + t) % HOT_KEYS)
                    } else {
                        format!("scan-{t}-{i}")
                    };
                    read_through(&cache, &backend, &key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let elapsed = start.elapsed();

    let metrics = cache.lruk_metrics();
    let core = metrics.core();
    println!("⏱️  Finished in {elapsed:?}");
    println!("   • Backend fetches: {}", backend.fetches.load(Ordering::Relaxed));
    println!("   • Hit rate: {:.1}%", core.hit_rate() * 100.0);
    println!(
        "   • History: {} first sightings, {} promotions, {} evictions",
        metrics.history.first_sightings, metrics.history.promotions, metrics.history.core.evictions
    );
    println!(
        "   • Cache tier: {} payload writes, {} dropped puts, {} pending timeouts",
        metrics.promoted.payload_writes,
        metrics.promoted.dropped_puts,
        metrics.promoted.pending_timeouts
    );
    println!(
        "   • Occupancy: {} in history, {} cached\n",
        cache.history_len(),
        cache.cache_len()
    );

    println!("📋 {} metrics report:", cache.algorithm_name());
    for (name, value) in cache.metrics() {
        println!("   {name:<32} {value:>12.3}");
    }
}
