//! # Error Types
//!
//! Two families of errors surface from this crate:
//!
//! ```text
//!     ConfigError ──► construction time, fatal, never retried
//!     SubmitError ──► per submission, the task was NOT accepted
//! ```
//!
//! Task panics are not errors in this sense: they are caught on the worker
//! thread and reported through the pool's panic hook.

use std::io;
use thiserror::Error;

/// Invalid construction parameters for a pool or a rate limiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `maximum_pool_size` was zero.
    #[error("maximum_pool_size must be at least 1")]
    ZeroMaximumPoolSize,

    /// `core_pool_size` exceeded `maximum_pool_size`.
    #[error("core_pool_size ({core}) must not exceed maximum_pool_size ({max})")]
    CoreExceedsMaximum {
        /// Requested core size.
        core: usize,
        /// Requested maximum size.
        max: usize,
    },

    /// `queue_capacity` was zero.
    #[error("queue_capacity must be at least 1")]
    ZeroQueueCapacity,

    /// The rate limiter window was zero milliseconds.
    #[error("window_ms must be greater than 0")]
    ZeroWindow,

    /// The rate limiter could track no keys at all.
    #[error("max_keys must be greater than 0")]
    ZeroMaxKeys,
}

/// Reasons a task was refused by [`BoundedWorkerPool::submit`](crate::BoundedWorkerPool::submit).
///
/// Whenever `submit` returns one of these, the pool has dropped the task
/// without running it.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The pool was shut down before the task could be accepted.
    #[error("worker pool is shut down")]
    ShutDown,

    /// Queue full and every worker slot in use, under the `Reject` policy.
    #[error("worker pool saturated: {workers} workers busy and {queued} tasks queued")]
    Saturated {
        /// Live workers at the time of rejection.
        workers: usize,
        /// Tasks waiting in the queue at the time of rejection.
        queued: usize,
    },

    /// The thread factory failed to start a worker.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

impl SubmitError {
    /// Returns `true` for errors caused by load rather than by pool state.
    pub fn is_saturation(&self) -> bool {
        matches!(self, Self::Saturated { .. })
    }
}
