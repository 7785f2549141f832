//! # Workgate - Bounded Workers and Keyed Rate Limiting
//!
//! Two small concurrency primitives for the inside of a long-running service:
//!
//! - [`BoundedWorkerPool`]: a thread pool with core and maximum sizes and a
//!   bounded queue, which never strands an accepted task even when
//!   submissions race with workers finishing or retiring.
//! - [`RateLimiter`]: a per-key, time-windowed gate that admits the first
//!   event for a key, suppresses and counts repeats inside the window, and
//!   holds at most `max_keys` entries no matter how many keys it sees.
//!   [`RateLimitingLogger`] puts a logging sink on top of it.
//!
//! The two share no state; use either on its own.
//!
//! ## Worker Pool
//!
//! ```text
//!     submit ──► [core worker?] ──► [queue slot?] ──► [extra worker?] ──► saturated
//!                     │                  │                  │                │
//!                     ▼                  ▼                  ▼                ▼
//!                run directly      FIFO, woken idle     run directly    Reject / Block
//!                                  worker picks up
//! ```
//!
//! ```rust
//! use std::time::Duration;
//! use workgate::{BoundedWorkerPool, SubmitError};
//!
//! let pool = BoundedWorkerPool::new(2, 4, Duration::from_secs(30), 128).unwrap();
//!
//! pool.submit(|| println!("compacting segment 17")).unwrap();
//!
//! pool.shutdown();
//! assert!(matches!(pool.submit(|| {}), Err(SubmitError::ShutDown)));
//! assert!(pool.await_termination(Duration::from_secs(5)));
//! ```
//!
//! ## Rate Limiter
//!
//! ```text
//!     Per key, window = 5s:
//!
//!     t=0.0s  event ──► ✅ admitted      (window starts)
//!     t=0.1s  event ──► ❌ suppressed 1
//!     t=2.0s  event ──► ❌ suppressed 2
//!     t=5.3s  event ──► ✅ admitted      (2 were suppressed, window restarts)
//! ```
//!
//! ```rust
//! use workgate::RateLimiter;
//!
//! let limiter = RateLimiter::new(5_000, 10_000).unwrap();
//!
//! assert!(limiter.is_handleable(&"replica-3 unreachable"));
//! assert!(!limiter.is_handleable(&"replica-3 unreachable"));
//! assert_eq!(limiter.num_suppressed_msgs("replica-3 unreachable"), 1);
//! ```
//!
//! ## Rate-Limited Logging
//!
//! ```rust
//! use tracing::Level;
//! use workgate::RateLimitingLogger;
//!
//! // Admitted records go to `tracing` under the `workgate::ratelimited` target
//! let logger = RateLimitingLogger::to_tracing(60_000, 1_000).unwrap();
//!
//! for attempt in 0..100 {
//!     logger.log(&"store-9/fetch", Level::ERROR, format_args!("fetch failed ({attempt})"));
//! }
//! assert_eq!(logger.limited_message_count(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! Everything here is `Send + Sync`; share with `Arc`:
//! - [`SharedWorkerPool`] = `Arc<BoundedWorkerPool>`
//! - [`SharedRateLimiter<K>`] = `Arc<RateLimiter<K>>`
//!
//! ## Logging
//!
//! The crate logs through `tracing`. Worker lifecycle is at `debug`, pool
//! shutdown and termination at `info`, rejected submissions and a limiter
//! map filling up at `warn`, task panics at `error`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod error;
mod rate_limiter;
mod worker_pool;

pub use error::{ConfigError, SubmitError};
pub use rate_limiter::{
    current_time_ms, ByIdentity, Decision, HealthStatus, LogSink, RateLimiter, RateLimiterConfig,
    RateLimiterMetrics, RateLimitingLogger, TracingSink, DEFAULT_MAX_KEYS, DEFAULT_WINDOW_MS,
};
pub use worker_pool::{
    BoundedWorkerPool, NamedThreadFactory, PoolStats, SaturationPolicy, TaskHooks, TaskOutcome,
    ThreadFactory, WorkerBody, WorkerPoolConfig, DEFAULT_KEEP_ALIVE, DEFAULT_QUEUE_CAPACITY,
};

use std::hash::Hash;
use std::time::Duration;

/// A worker pool wrapped in `Arc` for sharing between submitters.
///
/// # Example
/// ```rust
/// use workgate::{BoundedWorkerPool, SharedWorkerPool};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let pool: SharedWorkerPool =
///     Arc::new(BoundedWorkerPool::new(1, 2, Duration::from_secs(1), 8).unwrap());
///
/// let submitter = pool.clone();
/// std::thread::spawn(move || submitter.submit(|| {}).unwrap())
///     .join()
///     .unwrap();
/// ```
pub type SharedWorkerPool = std::sync::Arc<BoundedWorkerPool>;

/// A rate limiter wrapped in `Arc` for convenient thread-safe sharing.
pub type SharedRateLimiter<K> = std::sync::Arc<RateLimiter<K>>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum supported Rust version.
///
/// `std::sync::OnceLock` needs 1.70.
pub const MSRV: &str = "1.70.0";

/// Prelude module for convenient imports.
///
/// ```rust
/// use workgate::prelude::*;
/// ```
pub mod prelude {
    //! Common imports.
    //!
    //! # Example
    //! ```rust
    //! use workgate::prelude::*;
    //!
    //! let limiter: RateLimiter<u64> = RateLimiter::new(1_000, 64).unwrap();
    //! let config = WorkerPoolConfig::fixed(2).with_saturation(SaturationPolicy::Block);
    //! let status = HealthStatus::Healthy;
    //! ```

    pub use crate::{
        BoundedWorkerPool, ConfigError, Decision, HealthStatus, LogSink, PoolStats, RateLimiter,
        RateLimiterConfig, RateLimiterMetrics, RateLimitingLogger, SaturationPolicy,
        SharedRateLimiter, SharedWorkerPool, SubmitError, TaskHooks, WorkerPoolBuilder,
        WorkerPoolConfig,
    };
}

/// Fluent construction of a [`BoundedWorkerPool`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use workgate::{SaturationPolicy, WorkerPoolBuilder};
///
/// let pool = WorkerPoolBuilder::new()
///     .core_pool_size(2)
///     .maximum_pool_size(8)
///     .keep_alive(Duration::from_secs(10))
///     .queue_capacity(64)
///     .saturation(SaturationPolicy::Block)
///     .thread_name_prefix("repair")
///     .on_panic(|msg| eprintln!("repair task failed: {msg}"))
///     .build()
///     .unwrap();
/// assert_eq!(pool.maximum_pool_size(), 8);
///
/// // Invalid bounds are caught at build time
/// let result = WorkerPoolBuilder::new()
///     .core_pool_size(4)
///     .maximum_pool_size(2)
///     .build();
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkerPoolBuilder {
    config: WorkerPoolConfig,
}

impl WorkerPoolBuilder {
    /// Creates a builder starting from [`WorkerPoolConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of workers kept alive while idle.
    pub fn core_pool_size(mut self, size: usize) -> Self {
        self.config.core_pool_size = size;
        self
    }

    /// Sets the cap on live workers.
    pub fn maximum_pool_size(mut self, size: usize) -> Self {
        self.config.maximum_pool_size = size;
        self
    }

    /// Sets how long an extra worker idles before retiring.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.config.keep_alive_time = keep_alive;
        self
    }

    /// Sets the number of queue slots.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Sets what a saturated `submit` does.
    pub fn saturation(mut self, policy: SaturationPolicy) -> Self {
        self.config.saturation = policy;
        self
    }

    /// Uses a custom thread factory.
    pub fn thread_factory(mut self, factory: impl ThreadFactory + 'static) -> Self {
        self.config = self.config.with_thread_factory(factory);
        self
    }

    /// Names worker threads `"<prefix>-<n>"`.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config = self.config.with_thread_name_prefix(prefix);
        self
    }

    /// Runs `hook` before each task.
    pub fn before_execute(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.config.hooks = self.config.hooks.before_execute(hook);
        self
    }

    /// Runs `hook` after each task with its outcome.
    pub fn after_execute(mut self, hook: impl Fn(&TaskOutcome) + Send + Sync + 'static) -> Self {
        self.config.hooks = self.config.hooks.after_execute(hook);
        self
    }

    /// Runs `hook` with the message of each task panic.
    pub fn on_panic(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.config.hooks = self.config.hooks.on_panic(hook);
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Validates the configuration and creates the pool.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the bounds are invalid.
    pub fn build(self) -> Result<BoundedWorkerPool, ConfigError> {
        BoundedWorkerPool::with_config(self.config)
    }
}

/// Fluent construction of a [`RateLimiter`].
///
/// # Example
///
/// ```rust
/// use workgate::{RateLimiter, RateLimiterBuilder};
///
/// let limiter: RateLimiter<String> = RateLimiterBuilder::new()
///     .window_ms(30_000)
///     .max_keys(500)
///     .build()
///     .unwrap();
/// assert_eq!(limiter.max_keys(), 500);
///
/// assert!(RateLimiterBuilder::new().window_ms(0).build::<String>().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RateLimiterBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterBuilder {
    /// Creates a builder with a 5 second window and 10 000 keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window length in milliseconds.
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.config.window_ms = window_ms;
        self
    }

    /// Sets the window length.
    ///
    /// Sub-millisecond precision is dropped.
    pub fn window(self, window: Duration) -> Self {
        self.window_ms(u64::try_from(window.as_millis()).unwrap_or(u64::MAX))
    }

    /// Sets the maximum number of tracked keys.
    pub fn max_keys(mut self, max_keys: usize) -> Self {
        self.config.max_keys = max_keys;
        self
    }

    /// Validates the configuration and creates the limiter.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the window or key cap is zero.
    pub fn build<K: Hash + Eq>(self) -> Result<RateLimiter<K>, ConfigError> {
        RateLimiter::with_config(self.config)
    }

    /// Validates the configuration and creates a logger over `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the window or key cap is zero.
    pub fn build_logger<K: Hash + Eq, S: LogSink>(
        self,
        sink: S,
    ) -> Result<RateLimitingLogger<K, S>, ConfigError> {
        RateLimitingLogger::with_config(self.config, sink)
    }
}
