//! # Bounded Worker Pool
//!
//! A thread pool with a core size, a maximum size and a bounded FIFO queue.
//!
//! ## Dispatch
//!
//! ```text
//!     submit(task)
//!         │
//!         ├─ workers < core ───────────► start worker, run task directly
//!         │
//!         ├─ queue has room ───────────► enqueue, then wake an idle worker
//!         │                              (or start one if none are alive)
//!         │
//!         ├─ workers < max ────────────► start extra worker, run task directly
//!         │
//!         └─ saturated ────────────────► Reject: Err(Saturated)
//!                                        Block:  wait for space, retry
//! ```
//!
//! ## Hand-off
//!
//! All dispatch state (queue, worker count, idle count, shutdown flag) lives
//! under one mutex. A worker that finds the queue empty registers itself as
//! idle and parks on the `work_available` condvar in the same critical
//! section, and it only decides to retire while still holding the lock with
//! the queue observed empty. A submitter that enqueues therefore sees one of
//! three things:
//!
//! ```text
//!     idle > 0      ──► notify_one; a parked worker re-checks the queue
//!     workers == 0  ──► start a worker for the queue
//!     otherwise     ──► every live worker is between tasks or running one,
//!                       and will pop the queue before it may park or retire
//! ```
//!
//! There is no window in which a task sits in the queue while every worker
//! has already decided never to look at it again.
//!
//! ## Lifecycle
//!
//! ```text
//!     Running ──shutdown()──► ShuttingDown ──last worker exits──► Terminated
//!                              (queue drains,
//!                               submit refused)
//! ```

use super::{
    config::{SaturationPolicy, TaskOutcome, WorkerPoolConfig},
    stats::PoolStats,
};
use crate::error::{ConfigError, SubmitError};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Dispatch state guarded by the pool mutex.
#[derive(Default)]
struct PoolState {
    queue: VecDeque<Task>,
    /// Live workers, including ones spawned but not yet running.
    workers: usize,
    /// Workers parked on `work_available`.
    idle: usize,
    /// Workers running a task.
    active: usize,
    /// Submitters parked on `space_available`.
    blocked_submitters: usize,
    largest_pool_size: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    work_available: Condvar,
    space_available: Condvar,
    terminated: Condvar,
    config: WorkerPoolConfig,
    completed: AtomicU64,
    panicked: AtomicU64,
    rejected: AtomicU64,
}

/// Thread pool with bounded workers and a bounded task queue.
///
/// Every task accepted by [`submit`](Self::submit) runs exactly once, even
/// when submissions race with workers finishing and retiring. A panicking
/// task is caught on its worker, reported, and the worker carries on.
///
/// ## Example
///
/// ```rust
/// use std::sync::mpsc;
/// use std::time::Duration;
/// use workgate::BoundedWorkerPool;
///
/// let pool = BoundedWorkerPool::new(2, 4, Duration::from_secs(30), 16).unwrap();
/// let (tx, rx) = mpsc::channel();
///
/// for i in 0..8 {
///     let tx = tx.clone();
///     pool.submit(move || tx.send(i * i).unwrap()).unwrap();
/// }
///
/// let mut squares: Vec<i32> = rx.iter().take(8).collect();
/// squares.sort();
/// assert_eq!(squares, vec![0, 1, 4, 9, 16, 25, 36, 49]);
///
/// pool.shutdown();
/// assert!(pool.await_termination(Duration::from_secs(5)));
/// ```
///
/// Dropping the pool calls [`shutdown`](Self::shutdown); queued tasks still
/// run but nothing waits for them.
pub struct BoundedWorkerPool {
    shared: Arc<Shared>,
}

impl BoundedWorkerPool {
    /// Creates a pool with the default thread factory and `Reject` policy.
    ///
    /// No threads start until the first submission.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the bounds are invalid.
    pub fn new(
        core_pool_size: usize,
        maximum_pool_size: usize,
        keep_alive_time: Duration,
        queue_capacity: usize,
    ) -> Result<Self, ConfigError> {
        Self::with_config(WorkerPoolConfig::new(
            core_pool_size,
            maximum_pool_size,
            keep_alive_time,
            queue_capacity,
        ))
    }

    /// Creates a pool from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration does not validate.
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        debug!(
            core = config.core_pool_size,
            max = config.maximum_pool_size,
            queue_capacity = config.queue_capacity,
            saturation = ?config.saturation,
            "Created worker pool"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState::default()),
                work_available: Condvar::new(),
                space_available: Condvar::new(),
                terminated: Condvar::new(),
                config,
                completed: AtomicU64::new(0),
                panicked: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
            }),
        })
    }

    /// Submits a task for execution.
    ///
    /// On `Ok` the task is guaranteed to run. Under
    /// [`SaturationPolicy::Block`] this call may park the calling thread until
    /// room frees up.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::ShutDown`] once [`shutdown`](Self::shutdown) was called
    /// - [`SubmitError::Saturated`] when full under [`SaturationPolicy::Reject`]
    /// - [`SubmitError::Spawn`] when a needed worker thread could not start
    ///
    /// In every error case the task has been dropped without running.
    pub fn submit<F>(&self, task: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(Box::new(task))
    }

    fn dispatch(&self, task: Task) -> Result<(), SubmitError> {
        let config = &self.shared.config;
        let mut state = self.shared.state.lock();

        loop {
            if state.shutdown {
                return Err(SubmitError::ShutDown);
            }

            if state.workers < config.core_pool_size {
                return self.start_worker(&mut state, Some(task));
            }

            if state.queue.len() < config.queue_capacity {
                state.queue.push_back(task);
                if state.idle > 0 {
                    self.shared.work_available.notify_one();
                } else if state.workers == 0 {
                    // Only reachable with a zero core size
                    if let Err(e) = self.start_worker(&mut state, None) {
                        state.queue.pop_back();
                        return Err(e);
                    }
                }
                return Ok(());
            }

            if state.workers < config.maximum_pool_size {
                return self.start_worker(&mut state, Some(task));
            }

            match config.saturation {
                SaturationPolicy::Reject => {
                    self.shared.rejected.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        workers = state.workers,
                        queued = state.queue.len(),
                        "Worker pool saturated, rejecting task"
                    );
                    return Err(SubmitError::Saturated {
                        workers: state.workers,
                        queued: state.queue.len(),
                    });
                }
                SaturationPolicy::Block => {
                    state.blocked_submitters += 1;
                    self.shared.space_available.wait(&mut state);
                    state.blocked_submitters -= 1;
                }
            }
        }
    }

    /// Starts a worker, optionally with a first task that skips the queue.
    ///
    /// Called with the pool lock held so the worker count can never overshoot.
    fn start_worker(
        &self,
        state: &mut MutexGuard<'_, PoolState>,
        first_task: Option<Task>,
    ) -> Result<(), SubmitError> {
        let has_task = first_task.is_some();
        state.workers += 1;
        if has_task {
            state.active += 1;
        }

        let shared = Arc::clone(&self.shared);
        let body = Box::new(move || run_worker(shared, first_task));

        match self.shared.config.thread_factory.new_thread(body) {
            Ok(_) => {
                state.largest_pool_size = state.largest_pool_size.max(state.workers);
                debug!(
                    workers = state.workers,
                    core = self.shared.config.core_pool_size,
                    "Started worker"
                );
                Ok(())
            }
            Err(e) => {
                state.workers -= 1;
                if has_task {
                    state.active -= 1;
                }
                warn!(error = %e, "Failed to start worker thread");
                Err(SubmitError::Spawn(e))
            }
        }
    }

    /// Stops accepting tasks. Queued and running tasks still complete.
    ///
    /// Returns immediately and may be called any number of times.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return;
        }
        state.shutdown = true;

        info!(
            workers = state.workers,
            queued = state.queue.len(),
            "Worker pool shutting down"
        );

        self.shared.work_available.notify_all();
        self.shared.space_available.notify_all();
        if state.workers == 0 {
            self.shared.terminated.notify_all();
        }
    }

    /// Waits up to `timeout` for the pool to terminate.
    ///
    /// Returns `true` if every worker has exited after
    /// [`shutdown`](Self::shutdown). Without a prior shutdown this waits out
    /// the whole timeout and returns `false`.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let mut state = self.shared.state.lock();

        // Timeouts past the clock's range wait without a deadline
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while !(state.shutdown && state.workers == 0) {
                self.shared.terminated.wait(&mut state);
            }
            return true;
        };

        while !(state.shutdown && state.workers == 0) {
            if self
                .shared
                .terminated
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.shutdown && state.workers == 0;
            }
        }
        true
    }

    /// Configured core size.
    pub fn core_pool_size(&self) -> usize {
        self.shared.config.core_pool_size
    }

    /// Configured maximum size.
    pub fn maximum_pool_size(&self) -> usize {
        self.shared.config.maximum_pool_size
    }

    /// Configured keep-alive time for extra workers.
    pub fn keep_alive_time(&self) -> Duration {
        self.shared.config.keep_alive_time
    }

    /// Configured queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.shared.config.queue_capacity
    }

    /// Configured saturation policy.
    pub fn saturation_policy(&self) -> SaturationPolicy {
        self.shared.config.saturation
    }

    /// Live workers.
    pub fn pool_size(&self) -> usize {
        self.shared.state.lock().workers
    }

    /// Workers currently running a task.
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Tasks waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Tasks that have finished, panicked ones included.
    pub fn completed_task_count(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    /// Whether the pool is shut down and every worker has exited.
    pub fn is_terminated(&self) -> bool {
        let state = self.shared.state.lock();
        state.shutdown && state.workers == 0
    }

    /// Consistent snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        let config = &self.shared.config;
        PoolStats {
            pool_size: state.workers,
            active_count: state.active,
            idle_count: state.idle,
            largest_pool_size: state.largest_pool_size,
            queued_tasks: state.queue.len(),
            queue_capacity: config.queue_capacity,
            core_pool_size: config.core_pool_size,
            maximum_pool_size: config.maximum_pool_size,
            completed_tasks: self.shared.completed.load(Ordering::Relaxed),
            panicked_tasks: self.shared.panicked.load(Ordering::Relaxed),
            rejected_tasks: self.shared.rejected.load(Ordering::Relaxed),
            is_shutdown: state.shutdown,
        }
    }
}

impl Drop for BoundedWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for BoundedWorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("BoundedWorkerPool")
            .field("config", &self.shared.config)
            .field("workers", &state.workers)
            .field("active", &state.active)
            .field("queued", &state.queue.len())
            .field("shutdown", &state.shutdown)
            .finish()
    }
}

/// Worker thread body: run the first task if any, then drain the queue
/// until told to retire.
fn run_worker(shared: Arc<Shared>, first_task: Option<Task>) {
    let mut next = first_task;
    let mut ran_task = false;

    loop {
        let task = match next.take() {
            Some(task) => task,
            None => match shared.next_task(ran_task) {
                Some(task) => task,
                None => return,
            },
        };
        shared.execute(task);
        ran_task = true;
    }
}

impl Shared {
    /// Blocks until a task is available or this worker should retire.
    ///
    /// `finished_task` releases the caller's active slot in the same critical
    /// section that looks for more work. Returns `None` after the worker has
    /// been removed from the count.
    fn next_task(&self, finished_task: bool) -> Option<Task> {
        let mut state = self.state.lock();
        if finished_task {
            state.active -= 1;
        }

        let mut timed_out = false;
        loop {
            if let Some(task) = state.queue.pop_front() {
                state.active += 1;
                if state.blocked_submitters > 0 {
                    self.space_available.notify_one();
                }
                return Some(task);
            }

            if state.shutdown {
                break;
            }

            let above_core = state.workers > self.config.core_pool_size;
            if above_core && timed_out {
                break;
            }

            state.idle += 1;
            if above_core {
                timed_out = self
                    .work_available
                    .wait_for(&mut state, self.config.keep_alive_time)
                    .timed_out();
            } else {
                self.work_available.wait(&mut state);
            }
            state.idle -= 1;
        }

        state.workers -= 1;
        debug!(
            workers = state.workers,
            shutdown = state.shutdown,
            "Worker retiring"
        );

        if state.blocked_submitters > 0 {
            // A worker slot opened up
            self.space_available.notify_one();
        }
        if state.shutdown && state.workers == 0 {
            info!(
                completed = self.completed.load(Ordering::Relaxed),
                "Worker pool terminated"
            );
            self.terminated.notify_all();
        }
        None
    }

    /// Runs one task with its hooks, containing any panic.
    fn execute(&self, task: Task) {
        let hooks = &self.config.hooks;

        if let Some(before) = &hooks.before_execute {
            self.guard_hook("before_execute", || before());
        }

        let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => TaskOutcome::Completed,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.panicked.fetch_add(1, Ordering::Relaxed);
                error!(
                    worker = thread::current().name().unwrap_or("<unnamed>"),
                    panic = %message,
                    "Task panicked"
                );
                if let Some(on_panic) = &hooks.on_panic {
                    self.guard_hook("on_panic", || on_panic(&message));
                }
                TaskOutcome::Panicked(message)
            }
        };
        self.completed.fetch_add(1, Ordering::Relaxed);

        if let Some(after) = &hooks.after_execute {
            self.guard_hook("after_execute", || after(&outcome));
        }
    }

    fn guard_hook(&self, name: &str, hook: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(hook)) {
            error!(
                hook = name,
                panic = %panic_message(payload.as_ref()),
                "Task hook panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker_pool::config::TaskHooks;
    use crate::worker_pool::factory::{ThreadFactory, WorkerBody};
    use std::io;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{mpsc, Barrier};

    const WAIT: Duration = Duration::from_secs(10);

    fn pool(core: usize, max: usize, keep_alive_ms: u64, queue: usize) -> BoundedWorkerPool {
        BoundedWorkerPool::new(core, max, Duration::from_millis(keep_alive_ms), queue).unwrap()
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(matches!(
            BoundedWorkerPool::new(0, 0, Duration::ZERO, 1),
            Err(ConfigError::ZeroMaximumPoolSize)
        ));
        assert!(matches!(
            BoundedWorkerPool::new(4, 2, Duration::ZERO, 1),
            Err(ConfigError::CoreExceedsMaximum { core: 4, max: 2 })
        ));
        assert!(matches!(
            BoundedWorkerPool::new(1, 2, Duration::ZERO, 0),
            Err(ConfigError::ZeroQueueCapacity)
        ));
    }

    #[test]
    fn test_accessors_report_config() {
        let pool = pool(2, 5, 1_500, 7);
        assert_eq!(pool.core_pool_size(), 2);
        assert_eq!(pool.maximum_pool_size(), 5);
        assert_eq!(pool.keep_alive_time(), Duration::from_millis(1_500));
        assert_eq!(pool.keep_alive_time().as_secs(), 1);
        assert_eq!(pool.queue_capacity(), 7);
        assert_eq!(pool.saturation_policy(), SaturationPolicy::Reject);
        assert_eq!(pool.pool_size(), 0);
    }

    #[test]
    fn test_runs_all_tasks() {
        let pool = pool(2, 4, 100, 64);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.shutdown();
        assert!(pool.await_termination(WAIT));
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert_eq!(pool.completed_task_count(), 50);
    }

    #[test]
    fn test_core_workers_start_first() {
        let pool = pool(3, 3, 0, 8);
        let gate = Arc::new(Barrier::new(4));

        for _ in 0..3 {
            let gate = gate.clone();
            pool.submit(move || {
                gate.wait();
            })
            .unwrap();
        }

        assert_eq!(pool.pool_size(), 3);
        assert_eq!(pool.queue_len(), 0);
        gate.wait();
    }

    #[test]
    fn test_queue_then_extra_workers_then_reject() {
        let pool = pool(1, 2, 60_000, 1);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Arc::new(Mutex::new(release_rx));
        let (started_tx, started_rx) = mpsc::channel();

        let blocker = |started: mpsc::Sender<()>, release: Arc<Mutex<mpsc::Receiver<()>>>| {
            move || {
                started.send(()).unwrap();
                release.lock().recv().unwrap();
            }
        };

        // core worker
        pool.submit(blocker(started_tx.clone(), release_rx.clone()))
            .unwrap();
        started_rx.recv_timeout(WAIT).unwrap();

        // queued
        pool.submit(blocker(started_tx.clone(), release_rx.clone()))
            .unwrap();
        assert_eq!(pool.queue_len(), 1);

        // extra worker
        pool.submit(blocker(started_tx.clone(), release_rx.clone()))
            .unwrap();
        started_rx.recv_timeout(WAIT).unwrap();
        assert_eq!(pool.pool_size(), 2);

        // saturated
        let err = pool.submit(|| {}).unwrap_err();
        assert!(err.is_saturation());
        assert_eq!(pool.stats().rejected_tasks, 1);
        assert!(pool.stats().is_saturated());

        for _ in 0..3 {
            release_tx.send(()).unwrap();
        }
        pool.shutdown();
        assert!(pool.await_termination(WAIT));
        assert_eq!(pool.completed_task_count(), 3);
    }

    #[test]
    fn test_queued_tasks_run_fifo() {
        let pool = pool(1, 1, 0, 16);
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (order_tx, order_rx) = mpsc::channel();

        pool.submit(move || gate_rx.recv().unwrap()).unwrap();
        for i in 0..10 {
            let order_tx = order_tx.clone();
            pool.submit(move || order_tx.send(i).unwrap()).unwrap();
        }
        gate_tx.send(()).unwrap();

        let order: Vec<i32> = (0..10)
            .map(|_| order_rx.recv_timeout(WAIT).unwrap())
            .collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = pool(1, 1, 0, 1);
        pool.shutdown();
        pool.shutdown();

        assert!(matches!(pool.submit(|| {}), Err(SubmitError::ShutDown)));
        assert!(pool.is_shutdown());
        assert!(pool.is_terminated());
        assert!(pool.await_termination(Duration::ZERO));
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let pool = pool(1, 1, 0, 32);
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(move || gate_rx.recv().unwrap()).unwrap();
        for _ in 0..20 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.shutdown();
        assert!(!pool.is_terminated());
        gate_tx.send(()).unwrap();

        assert!(pool.await_termination(WAIT));
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_await_termination_times_out_while_running() {
        let pool = pool(1, 1, 0, 1);
        assert!(!pool.await_termination(Duration::from_millis(20)));

        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        pool.submit(move || gate_rx.recv().unwrap()).unwrap();
        pool.shutdown();
        assert!(!pool.await_termination(Duration::from_millis(20)));

        gate_tx.send(()).unwrap();
        assert!(pool.await_termination(WAIT));
    }

    #[test]
    fn test_await_termination_unbounded_timeout() {
        let pool = pool(1, 2, 0, 4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let counter = counter.clone();
            pool.submit(move || {
                thread::sleep(Duration::from_millis(5));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown();

        assert!(pool.await_termination(Duration::MAX));
        assert_eq!(counter.load(Ordering::SeqCst), 6);
        assert!(pool.await_termination(Duration::MAX));
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let panics = Arc::new(Mutex::new(Vec::new()));
        let seen = panics.clone();
        let config = WorkerPoolConfig::new(1, 1, Duration::ZERO, 8).with_hooks(
            TaskHooks::new().on_panic(move |msg| seen.lock().push(msg.to_string())),
        );
        let pool = BoundedWorkerPool::with_config(config).unwrap();

        let (tx, rx) = mpsc::channel();
        pool.submit(|| panic!("task exploded")).unwrap();
        pool.submit(move || tx.send("still alive").unwrap()).unwrap();

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "still alive");
        assert_eq!(pool.pool_size(), 1);

        pool.shutdown();
        assert!(pool.await_termination(WAIT));
        assert_eq!(panics.lock().as_slice(), ["task exploded"]);

        let stats = pool.stats();
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.panicked_tasks, 1);
    }

    #[test]
    fn test_hooks_run_around_tasks() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let before = events.clone();
        let after = events.clone();
        let hooks = TaskHooks::new()
            .before_execute(move || before.lock().push("before".to_string()))
            .after_execute(move |outcome| {
                after.lock().push(format!("after:{}", outcome.is_panic()))
            });
        let pool =
            BoundedWorkerPool::with_config(WorkerPoolConfig::fixed(1).with_hooks(hooks)).unwrap();

        let inner = events.clone();
        pool.submit(move || inner.lock().push("task".to_string()))
            .unwrap();
        pool.shutdown();
        assert!(pool.await_termination(WAIT));

        assert_eq!(
            events.lock().as_slice(),
            ["before", "task", "after:false"]
        );
    }

    #[test]
    fn test_panicking_hook_is_contained() {
        let hooks = TaskHooks::new().before_execute(|| panic!("bad hook"));
        let pool =
            BoundedWorkerPool::with_config(WorkerPoolConfig::fixed(1).with_hooks(hooks)).unwrap();

        let (tx, rx) = mpsc::channel();
        pool.submit(move || tx.send(1).unwrap()).unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert_eq!(pool.stats().panicked_tasks, 0);
    }

    #[test]
    fn test_extra_workers_retire_after_keep_alive() {
        let pool = pool(1, 3, 50, 1);
        let gate = Arc::new(Barrier::new(4));
        let gated = || {
            let gate = gate.clone();
            move || {
                gate.wait();
            }
        };

        // core worker, queued, then two extra workers
        pool.submit(gated()).unwrap();
        pool.submit(|| {}).unwrap();
        pool.submit(gated()).unwrap();
        pool.submit(gated()).unwrap();
        assert_eq!(pool.pool_size(), 3);
        gate.wait();

        let deadline = Instant::now() + WAIT;
        while pool.pool_size() > 1 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(pool.pool_size(), 1);
        assert_eq!(pool.completed_task_count(), 4);
        assert_eq!(pool.stats().largest_pool_size, 3);
    }

    #[test]
    fn test_zero_core_pool_restarts_after_retiring() {
        let pool = pool(0, 1, 10, 1);

        for _ in 0..2 {
            let (tx, rx) = mpsc::channel();
            pool.submit(move || tx.send(()).unwrap()).unwrap();
            rx.recv_timeout(WAIT).unwrap();

            let deadline = Instant::now() + WAIT;
            while pool.pool_size() > 0 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            assert_eq!(pool.pool_size(), 0);
        }
        assert_eq!(pool.completed_task_count(), 2);
    }

    #[test]
    fn test_core_workers_outlive_keep_alive() {
        let pool = pool(2, 2, 10, 4);
        let gate = Arc::new(Barrier::new(3));
        for _ in 0..2 {
            let gate = gate.clone();
            pool.submit(move || {
                gate.wait();
            })
            .unwrap();
        }
        gate.wait();

        thread::sleep(Duration::from_millis(100));
        assert_eq!(pool.pool_size(), 2);
    }

    #[test]
    fn test_block_policy_waits_for_space() {
        let config = WorkerPoolConfig::new(1, 1, Duration::ZERO, 1)
            .with_saturation(SaturationPolicy::Block);
        let pool = Arc::new(BoundedWorkerPool::with_config(config).unwrap());
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(move || gate_rx.recv().unwrap()).unwrap();
        pool.submit(|| {}).unwrap();

        let submitter = {
            let pool = pool.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        gate_tx.send(()).unwrap();
        submitter.join().unwrap().unwrap();

        pool.shutdown();
        assert!(pool.await_termination(WAIT));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocked_submitter_released_by_shutdown() {
        let config = WorkerPoolConfig::new(1, 1, Duration::ZERO, 1)
            .with_saturation(SaturationPolicy::Block);
        let pool = Arc::new(BoundedWorkerPool::with_config(config).unwrap());
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        pool.submit(move || gate_rx.recv().unwrap()).unwrap();
        pool.submit(|| {}).unwrap();

        let submitter = {
            let pool = pool.clone();
            thread::spawn(move || pool.submit(|| {}))
        };
        thread::sleep(Duration::from_millis(50));

        pool.shutdown();
        assert!(matches!(
            submitter.join().unwrap(),
            Err(SubmitError::ShutDown)
        ));

        gate_tx.send(()).unwrap();
        assert!(pool.await_termination(WAIT));
    }

    struct FailingFactory;

    impl ThreadFactory for FailingFactory {
        fn new_thread(&self, _body: WorkerBody) -> io::Result<thread::JoinHandle<()>> {
            Err(io::Error::new(io::ErrorKind::Other, "no threads today"))
        }
    }

    #[test]
    fn test_spawn_failure_reported() {
        let config =
            WorkerPoolConfig::new(0, 1, Duration::ZERO, 1).with_thread_factory(FailingFactory);
        let pool = BoundedWorkerPool::with_config(config).unwrap();

        assert!(matches!(pool.submit(|| {}), Err(SubmitError::Spawn(_))));
        assert_eq!(pool.pool_size(), 0);
        assert_eq!(pool.queue_len(), 0);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_named_threads() {
        let config = WorkerPoolConfig::fixed(1).with_thread_name_prefix("indexer");
        let pool = BoundedWorkerPool::with_config(config).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.submit(move || {
            tx.send(thread::current().name().map(str::to_string)).unwrap()
        })
        .unwrap();

        assert_eq!(rx.recv_timeout(WAIT).unwrap().as_deref(), Some("indexer-1"));
    }

    #[test]
    fn test_drop_shuts_down() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = pool(1, 1, 0, 8);
            for _ in 0..5 {
                let counter = counter.clone();
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }

        let deadline = Instant::now() + WAIT;
        while counter.load(Ordering::SeqCst) < 5 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_debug_output() {
        let pool = pool(1, 2, 0, 4);
        let debug_str = format!("{:?}", pool);
        assert!(debug_str.contains("BoundedWorkerPool"));
        assert!(debug_str.contains("workers: 0"));
    }
}
