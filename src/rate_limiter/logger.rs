//! # Rate-Limited Logging
//!
//! A thin layer over [`RateLimiter`] for noisy error paths. Each call names a
//! key (typically "which failure, where"); the first record per window goes
//! to the sink, the rest are counted and reported with the next one.
//!
//! ```text
//!     log(k, ERROR, "disk slow")  ──► ✅ "disk slow"
//!     log(k, ERROR, "disk slow")  ──► ❌ (counted)
//!     log(k, ERROR, "disk slow")  ──► ❌ (counted)
//!         ... window elapses ...
//!     log(k, ERROR, "disk slow")  ──► ✅ "disk slow (suppressed 2 similar messages)"
//! ```

use super::{
    config::RateLimiterConfig,
    core::{Decision, RateLimiter},
};
use crate::error::ConfigError;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use tracing::Level;

/// Destination for admitted log records.
///
/// Closures `Fn(Level, &str)` implement this trait, which is handy for tests
/// and for bridging into other logging systems.
pub trait LogSink: Send + Sync {
    /// Writes one record at `level`.
    fn emit(&self, level: Level, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn emit(&self, level: Level, message: &str) {
        self(level, message)
    }
}

/// Sink forwarding records to the `tracing` subscriber under the
/// `workgate::ratelimited` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        // tracing's macros need the level as a constant
        match level {
            Level::ERROR => tracing::error!(target: "workgate::ratelimited", "{}", message),
            Level::WARN => tracing::warn!(target: "workgate::ratelimited", "{}", message),
            Level::INFO => tracing::info!(target: "workgate::ratelimited", "{}", message),
            Level::DEBUG => tracing::debug!(target: "workgate::ratelimited", "{}", message),
            _ => tracing::trace!(target: "workgate::ratelimited", "{}", message),
        }
    }
}

/// Logger that emits at most one record per key per window.
///
/// ## Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use tracing::Level;
/// use workgate::RateLimitingLogger;
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let captured = lines.clone();
/// let logger = RateLimitingLogger::new(60_000, 100, move |_: Level, msg: &str| {
///     captured.lock().unwrap().push(msg.to_string());
/// })
/// .unwrap();
///
/// for _ in 0..10 {
///     logger.log(&"store-7", Level::ERROR, "fetch failed");
/// }
///
/// assert_eq!(lines.lock().unwrap().len(), 1);
/// assert_eq!(logger.num_suppressed_msgs(&"store-7"), 9);
/// ```
pub struct RateLimitingLogger<K, S = TracingSink> {
    limiter: RateLimiter<K>,
    sink: S,
}

impl<K> RateLimitingLogger<K, TracingSink>
where
    K: Hash + Eq,
{
    /// Logger writing to `tracing` with the given window and key cap.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either argument is zero.
    pub fn to_tracing(window_ms: u64, max_keys: usize) -> Result<Self, ConfigError> {
        Self::new(window_ms, max_keys, TracingSink)
    }
}

impl<K, S> RateLimitingLogger<K, S>
where
    K: Hash + Eq,
    S: LogSink,
{
    /// Creates a logger over a fresh limiter.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either limiter argument is zero.
    pub fn new(window_ms: u64, max_keys: usize, sink: S) -> Result<Self, ConfigError> {
        Self::with_config(RateLimiterConfig::new(window_ms, max_keys), sink)
    }

    /// Creates a logger from a limiter configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn with_config(config: RateLimiterConfig, sink: S) -> Result<Self, ConfigError> {
        Ok(Self {
            limiter: RateLimiter::with_config(config)?,
            sink,
        })
    }

    /// Emits `message` at `level` if `key` is admitted.
    ///
    /// When earlier records for the key were suppressed, the emitted message
    /// carries their count. Returns `true` if a record was written.
    pub fn log(&self, key: &K, level: Level, message: impl fmt::Display) -> bool
    where
        K: Clone,
    {
        match self.limiter.check(key) {
            Decision::Admitted { suppressed } if suppressed > 0 => {
                let line = format!(
                    "{} (suppressed {} similar message{})",
                    message,
                    suppressed,
                    if suppressed == 1 { "" } else { "s" }
                );
                self.sink.emit(level, &line);
                true
            }
            Decision::Admitted { .. } | Decision::Untracked => {
                self.sink.emit(level, &message.to_string());
                true
            }
            Decision::Suppressed { .. } => false,
        }
    }

    /// Shorthand for [`log`](Self::log) at `ERROR`.
    pub fn error(&self, key: &K, message: impl fmt::Display) -> bool
    where
        K: Clone,
    {
        self.log(key, Level::ERROR, message)
    }

    /// Shorthand for [`log`](Self::log) at `WARN`.
    pub fn warn(&self, key: &K, message: impl fmt::Display) -> bool
    where
        K: Clone,
    {
        self.log(key, Level::WARN, message)
    }

    /// Shorthand for [`log`](Self::log) at `INFO`.
    pub fn info(&self, key: &K, message: impl fmt::Display) -> bool
    where
        K: Clone,
    {
        self.log(key, Level::INFO, message)
    }

    /// Suppressed count for `key` since its last emitted record.
    pub fn num_suppressed_msgs<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.limiter.num_suppressed_msgs(key)
    }
}

impl<K: Hash + Eq, S> RateLimitingLogger<K, S> {
    /// The wrapped limiter, for metrics and maintenance.
    pub fn limiter(&self) -> &RateLimiter<K> {
        &self.limiter
    }

    /// The sink records are written to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Records emitted since construction.
    pub fn limited_message_count(&self) -> u64 {
        self.limiter.limited_message_count()
    }

    /// Keys currently tracked.
    pub fn map_size(&self) -> usize {
        self.limiter.map_size()
    }
}

impl<K: Hash + Eq, S> fmt::Debug for RateLimitingLogger<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitingLogger")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}
