//! Rate-limited error logging from pool workers.
//!
//! Run with `RUST_LOG=info cargo run --example error_logging`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use workgate::{RateLimitingLogger, WorkerPoolBuilder};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_thread_names(true)
        .init();

    // One record per failing store per second
    let logger = Arc::new(
        RateLimitingLogger::<String>::to_tracing(1_000, 1_024).expect("valid limiter settings"),
    );

    let pool = WorkerPoolBuilder::new()
        .core_pool_size(4)
        .maximum_pool_size(4)
        .queue_capacity(256)
        .thread_name_prefix("fetch")
        .on_panic(|msg| eprintln!("fetch task panicked: {}", msg))
        .build()
        .expect("valid pool settings");

    // Three flaky stores, each failing on every request for ~2.5 seconds
    for round in 0..25 {
        for store in ["store-1", "store-2", "store-3"] {
            for _ in 0..20 {
                let logger = logger.clone();
                let key = format!("{}/fetch", store);
                pool.submit(move || {
                    logger.error(&key, format_args!("{} fetch timed out (round {})", store, round));
                })
                .expect("pool running");
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    pool.shutdown();
    pool.await_termination(Duration::from_secs(5));

    let metrics = logger.limiter().metrics();
    println!("\n{}", metrics.summary());
    println!("\n{}", pool.stats().summary());
}
