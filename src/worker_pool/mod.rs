//! # Worker Pool Module
//!
//! ```text
//!     worker_pool/
//!     ├── mod.rs          (You are here - Module organization)
//!     ├── config.rs       (Bounds, saturation policy, hooks)
//!     ├── factory.rs      (Worker thread creation)
//!     ├── pool.rs         (Dispatch, hand-off, shutdown)
//!     └── stats.rs        (Point-in-time counters)
//! ```

mod config;
mod factory;
mod pool;
mod stats;

/// Pool configuration
pub use config::{
    SaturationPolicy, TaskHooks, TaskOutcome, WorkerPoolConfig, DEFAULT_KEEP_ALIVE,
    DEFAULT_QUEUE_CAPACITY,
};

/// Thread creation
pub use factory::{NamedThreadFactory, ThreadFactory, WorkerBody};

/// The pool itself
pub use pool::BoundedWorkerPool;

/// Statistics snapshot
pub use stats::PoolStats;
