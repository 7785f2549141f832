//! # Rate Limiter Module
//!
//! Keyed, time-windowed suppression of repeated events, and a logger built on
//! top of it.
//!
//! ## Module Structure
//!
//! ```text
//!     rate_limiter/
//!     ├── mod.rs          (You are here - Module organization)
//!     ├── config.rs       (Window length and key cap)
//!     ├── core.rs         (Per-key window state machine, bounded map)
//!     ├── key.rs          (Identity-based key wrapper)
//!     ├── logger.rs       (Rate-limited logging over a sink)
//!     ├── metrics.rs      (Counters and health)
//!     └── utils.rs        (Time base, cache alignment)
//! ```
//!
//! ## Flow
//!
//! ```text
//!     log(key, level, msg)
//!          │
//!          ▼
//!     ┌─────────┐
//!     │ Logger  │ ◄── formats the suppressed-count annotation
//!     └────┬────┘
//!          │ check(key)
//!          ▼
//!     ┌─────────┐
//!     │  Core   │ ◄── admit / suppress / pass through when full
//!     └────┬────┘
//!          │
//!          ▼
//!     ┌─────────┐
//!     │ Metrics │ ◄── admitted, suppressed, untracked counters
//!     └─────────┘
//! ```

mod config;
mod core;
mod key;
mod logger;
mod metrics;
mod utils;

/// Limiter configuration and defaults
pub use config::{RateLimiterConfig, DEFAULT_MAX_KEYS, DEFAULT_WINDOW_MS};

/// Keyed limiter and the outcome of a check
pub use self::core::{Decision, RateLimiter};

/// Pointer-identity keys
pub use key::ByIdentity;

/// Rate-limited logging
pub use logger::{LogSink, RateLimitingLogger, TracingSink};

/// Metrics and health monitoring
pub use metrics::{HealthStatus, RateLimiterMetrics};

/// Monotonic millisecond clock shared by all limiters
pub use utils::current_time_ms;
