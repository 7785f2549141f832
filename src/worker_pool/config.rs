//! # Worker Pool Configuration
//!
//! ```text
//!     Pool Bounds:
//!
//!     ┌──────────────── maximum_pool_size ────────────────┐
//!     │ ┌──── core_pool_size ────┐                        │
//!     │ │ W  W  W  (kept alive)  │  W  W  (extra workers, │
//!     │ └────────────────────────┘   retire after         │
//!     │                              keep_alive_time idle)│
//!     └───────────────────────────────────────────────────┘
//!
//!     Task Queue: [T][T][T][ ][ ]  ◄── queue_capacity slots
//! ```
//!
//! The order of preference on submit is: start a core worker, queue the
//! task, start an extra worker, then apply the [`SaturationPolicy`].

use super::factory::{NamedThreadFactory, ThreadFactory};
use crate::error::ConfigError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default idle time before an extra (non-core) worker retires.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Default number of queued tasks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// What `submit` does when the queue is full and every worker slot is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaturationPolicy {
    /// Return [`SubmitError::Saturated`](crate::SubmitError::Saturated)
    /// immediately. The task is dropped unrun.
    #[default]
    Reject,

    /// Block the submitting thread until a queue slot or worker slot frees
    /// up, or the pool shuts down.
    Block,
}

/// How a task finished, as reported to the after-execute hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task returned normally.
    Completed,
    /// The task panicked; carries the panic message.
    Panicked(String),
}

impl TaskOutcome {
    /// Returns `true` if the task panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

type BeforeHook = Arc<dyn Fn() + Send + Sync>;
type AfterHook = Arc<dyn Fn(&TaskOutcome) + Send + Sync>;
type PanicHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Callbacks run on the worker thread around every task.
///
/// A panic inside a hook is caught and logged like a task panic; it never
/// takes the worker down.
#[derive(Clone, Default)]
pub struct TaskHooks {
    pub(crate) before_execute: Option<BeforeHook>,
    pub(crate) after_execute: Option<AfterHook>,
    pub(crate) on_panic: Option<PanicHook>,
}

impl TaskHooks {
    /// Empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before each task on the worker that will execute it.
    pub fn before_execute(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_execute = Some(Arc::new(hook));
        self
    }

    /// Runs after each task, before the worker looks for more work.
    pub fn after_execute(mut self, hook: impl Fn(&TaskOutcome) + Send + Sync + 'static) -> Self {
        self.after_execute = Some(Arc::new(hook));
        self
    }

    /// Runs when a task panics, with the panic message.
    pub fn on_panic(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_panic = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for TaskHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHooks")
            .field("before_execute", &self.before_execute.is_some())
            .field("after_execute", &self.after_execute.is_some())
            .field("on_panic", &self.on_panic.is_some())
            .finish()
    }
}

/// Configuration for a [`BoundedWorkerPool`](crate::BoundedWorkerPool).
///
/// ## Examples
///
/// ```rust
/// use std::time::Duration;
/// use workgate::{SaturationPolicy, WorkerPoolConfig};
///
/// let config = WorkerPoolConfig::new(2, 8, Duration::from_secs(30), 256)
///     .with_saturation(SaturationPolicy::Block)
///     .with_thread_name_prefix("compaction");
/// assert!(config.validate().is_ok());
///
/// // A fixed-size pool
/// let fixed = WorkerPoolConfig::fixed(4);
/// assert_eq!(fixed.core_pool_size, fixed.maximum_pool_size);
/// ```
#[derive(Clone)]
pub struct WorkerPoolConfig {
    /// Workers kept alive even when idle.
    pub core_pool_size: usize,

    /// Hard cap on live workers. Must be at least 1 and at least
    /// `core_pool_size`.
    pub maximum_pool_size: usize,

    /// Idle time after which a worker above `core_pool_size` retires.
    pub keep_alive_time: Duration,

    /// Tasks that may wait for a worker. Must be at least 1.
    pub queue_capacity: usize,

    /// Behaviour when the queue is full at maximum size.
    pub saturation: SaturationPolicy,

    /// Creates worker threads.
    pub thread_factory: Arc<dyn ThreadFactory>,

    /// Callbacks around task execution.
    pub hooks: TaskHooks,
}

impl Default for WorkerPoolConfig {
    /// One worker per available core, no extra workers, 1024 queue slots.
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(cores, cores, DEFAULT_KEEP_ALIVE, DEFAULT_QUEUE_CAPACITY)
    }
}

impl WorkerPoolConfig {
    /// Creates a configuration with the given bounds and default factory,
    /// hooks and `Reject` saturation policy.
    pub fn new(
        core_pool_size: usize,
        maximum_pool_size: usize,
        keep_alive_time: Duration,
        queue_capacity: usize,
    ) -> Self {
        Self {
            core_pool_size,
            maximum_pool_size,
            keep_alive_time,
            queue_capacity,
            saturation: SaturationPolicy::default(),
            thread_factory: Arc::new(NamedThreadFactory::default()),
            hooks: TaskHooks::default(),
        }
    }

    /// `threads` permanent workers and the default queue.
    pub fn fixed(threads: usize) -> Self {
        Self::new(threads, threads, DEFAULT_KEEP_ALIVE, DEFAULT_QUEUE_CAPACITY)
    }

    /// Sets the saturation policy.
    pub fn with_saturation(mut self, saturation: SaturationPolicy) -> Self {
        self.saturation = saturation;
        self
    }

    /// Sets the thread factory.
    pub fn with_thread_factory(mut self, factory: impl ThreadFactory + 'static) -> Self {
        self.thread_factory = Arc::new(factory);
        self
    }

    /// Uses a [`NamedThreadFactory`] with the given name prefix.
    pub fn with_thread_name_prefix(self, prefix: impl Into<String>) -> Self {
        self.with_thread_factory(NamedThreadFactory::new(prefix))
    }

    /// Sets the task hooks.
    pub fn with_hooks(mut self, hooks: TaskHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Validates the bounds.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroMaximumPoolSize`] if `maximum_pool_size` is 0
    /// - [`ConfigError::CoreExceedsMaximum`] if `core_pool_size > maximum_pool_size`
    /// - [`ConfigError::ZeroQueueCapacity`] if `queue_capacity` is 0
    ///
    /// Sizes are unsigned and `keep_alive_time` is a `Duration`, so the
    /// "negative" cases cannot be expressed at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_pool_size == 0 {
            return Err(ConfigError::ZeroMaximumPoolSize);
        }
        if self.core_pool_size > self.maximum_pool_size {
            return Err(ConfigError::CoreExceedsMaximum {
                core: self.core_pool_size,
                max: self.maximum_pool_size,
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }

    /// Tasks the pool can hold at once: one per worker plus the queue.
    pub fn total_capacity(&self) -> usize {
        self.maximum_pool_size.saturating_add(self.queue_capacity)
    }
}

impl fmt::Debug for WorkerPoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPoolConfig")
            .field("core_pool_size", &self.core_pool_size)
            .field("maximum_pool_size", &self.maximum_pool_size)
            .field("keep_alive_time", &self.keep_alive_time)
            .field("queue_capacity", &self.queue_capacity)
            .field("saturation", &self.saturation)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let ok = WorkerPoolConfig::new(0, 1, Duration::ZERO, 1);
        assert!(ok.validate().is_ok());

        let zero_max = WorkerPoolConfig::new(0, 0, Duration::ZERO, 1);
        assert_eq!(zero_max.validate(), Err(ConfigError::ZeroMaximumPoolSize));

        let inverted = WorkerPoolConfig::new(3, 2, Duration::ZERO, 1);
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::CoreExceedsMaximum { core: 3, max: 2 })
        );

        let no_queue = WorkerPoolConfig::new(1, 1, Duration::ZERO, 0);
        assert_eq!(no_queue.validate(), Err(ConfigError::ZeroQueueCapacity));
    }

    #[test]
    fn test_defaults() {
        let config = WorkerPoolConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.core_pool_size >= 1);
        assert_eq!(config.saturation, SaturationPolicy::Reject);
        assert_eq!(config.keep_alive_time, DEFAULT_KEEP_ALIVE);

        let fixed = WorkerPoolConfig::fixed(3);
        assert_eq!(fixed.total_capacity(), 3 + DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_builder_methods() {
        let config = WorkerPoolConfig::new(1, 4, Duration::from_millis(10), 8)
            .with_saturation(SaturationPolicy::Block)
            .with_thread_name_prefix("flush")
            .with_hooks(TaskHooks::new().on_panic(|_| {}));

        assert_eq!(config.saturation, SaturationPolicy::Block);
        assert!(config.hooks.on_panic.is_some());
        assert!(config.hooks.before_execute.is_none());

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("maximum_pool_size: 4"));
        assert!(debug_str.contains("on_panic: true"));
    }

    #[test]
    fn test_task_outcome() {
        assert!(!TaskOutcome::Completed.is_panic());
        assert!(TaskOutcome::Panicked("boom".into()).is_panic());
    }
}
