//! Worker pool statistics.

use std::fmt;

/// Point-in-time view of a [`BoundedWorkerPool`](crate::BoundedWorkerPool).
///
/// The fields are read under the pool lock, so they are consistent with
/// each other; the pool may have moved on by the time you look at them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Live worker threads.
    pub pool_size: usize,

    /// Workers currently running a task.
    pub active_count: usize,

    /// Workers parked waiting for work.
    pub idle_count: usize,

    /// Most workers alive at once since construction.
    pub largest_pool_size: usize,

    /// Tasks waiting in the queue.
    pub queued_tasks: usize,

    /// Queue slots.
    pub queue_capacity: usize,

    /// Configured core size.
    pub core_pool_size: usize,

    /// Configured maximum size.
    pub maximum_pool_size: usize,

    /// Tasks that finished, including those that panicked.
    pub completed_tasks: u64,

    /// Tasks that panicked.
    pub panicked_tasks: u64,

    /// Submissions refused because the pool was saturated.
    pub rejected_tasks: u64,

    /// `shutdown` has been called.
    pub is_shutdown: bool,
}

impl PoolStats {
    /// Fraction of the maximum pool running tasks (0.0 to 1.0).
    pub fn utilization(&self) -> f64 {
        if self.maximum_pool_size == 0 {
            0.0
        } else {
            self.active_count as f64 / self.maximum_pool_size as f64
        }
    }

    /// `true` when the queue is full and no further worker can start.
    ///
    /// A submission seeing this state is rejected or blocked.
    pub fn is_saturated(&self) -> bool {
        self.queued_tasks >= self.queue_capacity && self.pool_size >= self.maximum_pool_size
    }

    /// `true` once shut down with every worker gone.
    pub fn is_terminated(&self) -> bool {
        self.is_shutdown && self.pool_size == 0
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        format!(
            "Worker Pool Stats:\n\
             ├─ Workers:\n\
             │  ├─ Live: {} (core {}, max {})\n\
             │  ├─ Active: {}  Idle: {}\n\
             │  ├─ Largest: {}\n\
             │  └─ Utilization: {:.2}%\n\
             ├─ Queue:\n\
             │  └─ Waiting: {}/{}\n\
             └─ Tasks:\n\
                ├─ Completed: {}\n\
                ├─ Panicked: {}\n\
                ├─ Rejected: {}\n\
                └─ State: {}",
            self.pool_size,
            self.core_pool_size,
            self.maximum_pool_size,
            self.active_count,
            self.idle_count,
            self.largest_pool_size,
            self.utilization() * 100.0,
            self.queued_tasks,
            self.queue_capacity,
            self.completed_tasks,
            self.panicked_tasks,
            self.rejected_tasks,
            if self.is_terminated() {
                "terminated"
            } else if self.is_shutdown {
                "shutting down"
            } else {
                "running"
            },
        )
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
