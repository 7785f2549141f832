//! Basic usage example for the workgate crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use workgate::{
    BoundedWorkerPool, RateLimiter, RateLimiterConfig, SaturationPolicy, SubmitError,
    WorkerPoolBuilder,
};

fn main() {
    println!("=== Worker Pool and Rate Limiter Example ===\n");

    // Example 1: Running tasks on a bounded pool
    pool_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 2: What saturation looks like
    saturation_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 3: Suppressing repeats of one event
    window_example();

    println!("{}", "\n".to_owned() + "=".repeat(50).as_str() + "\n");

    // Example 4: More keys than the limiter will track
    capacity_example();
}

fn pool_example() {
    println!("1. Bounded Worker Pool:");

    let pool = WorkerPoolBuilder::new()
        .core_pool_size(2)
        .maximum_pool_size(4)
        .keep_alive(Duration::from_millis(200))
        .queue_capacity(8)
        .saturation(SaturationPolicy::Block)
        .thread_name_prefix("demo")
        .build()
        .expect("valid pool configuration");

    println!(
        "   core={} max={} keep_alive={}ms queue={}",
        pool.core_pool_size(),
        pool.maximum_pool_size(),
        pool.keep_alive_time().as_millis(),
        pool.queue_capacity()
    );

    let (tx, rx) = mpsc::channel();
    for segment in 0..20 {
        let tx = tx.clone();
        pool.submit(move || {
            thread::sleep(Duration::from_millis(10));
            let worker = thread::current().name().unwrap_or("?").to_string();
            tx.send((segment, worker)).unwrap();
        })
        .expect("pool accepts work until shutdown");
    }
    drop(tx);

    for (segment, worker) in rx.iter().take(5) {
        println!("   segment {:>2} compacted on {}", segment, worker);
    }
    println!("   ...");

    pool.shutdown();
    pool.await_termination(Duration::from_secs(5));

    println!("\n{}", pool.stats().summary());
}

fn saturation_example() {
    println!("2. Saturation With the Reject Policy:");

    let pool = BoundedWorkerPool::new(1, 1, Duration::ZERO, 2).expect("valid pool configuration");
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    pool.submit(move || {
        let _ = gate_rx.recv();
    })
    .expect("first task starts a worker");

    let ran = Arc::new(AtomicUsize::new(0));
    for i in 1..=4 {
        let ran = ran.clone();
        match pool.submit(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        }) {
            Ok(()) => println!("   Task {} - ✅ queued", i),
            Err(err @ SubmitError::Saturated { .. }) => println!("   Task {} - ❌ {}", i, err),
            Err(err) => println!("   Task {} - error: {}", i, err),
        }
    }

    gate_tx.send(()).unwrap();
    pool.shutdown();
    pool.await_termination(Duration::from_secs(5));
    println!("   Queued tasks that ran: {}", ran.load(Ordering::SeqCst));
}

fn window_example() {
    println!("3. One Event per Window:");

    let limiter = RateLimiter::with_config(RateLimiterConfig::new(500, 100))
        .expect("valid limiter configuration");
    let key = "replica 10.0.0.7 unreachable";

    for attempt in 1..=5 {
        let verdict = if limiter.is_handleable(&key) {
            "✅ handle"
        } else {
            "❌ suppress"
        };
        println!("   attempt {} - {}", attempt, verdict);
    }
    println!("   suppressed so far: {}", limiter.num_suppressed_msgs(&key));

    println!("   waiting for the window to pass...");
    thread::sleep(Duration::from_millis(550));

    let decision = limiter.check(&key);
    println!(
        "   next attempt: admitted={} ({} suppressed before it)",
        decision.is_admitted(),
        decision.suppressed_before()
    );
}

fn capacity_example() {
    println!("4. Bounded Key Map:");

    let limiter = RateLimiter::new(60_000, 5).expect("valid limiter configuration");

    for store in 0..10u32 {
        limiter.is_handleable(&store);
    }

    println!(
        "   10 distinct keys seen, {} tracked, {} admitted",
        limiter.map_size(),
        limiter.limited_message_count()
    );
    println!(
        "   tracked key 0 limited: {}",
        !limiter.is_handleable(&0)
    );
    println!(
        "   untracked key 9 limited: {}",
        !limiter.is_handleable(&9)
    );

    let metrics = limiter.metrics();
    let health = metrics.health_status();
    println!("   Health status: {}", health);
    println!("   Suggested action: {}", health.suggested_action());
}
