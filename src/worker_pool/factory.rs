//! Worker thread creation.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Boxed body of a worker thread.
pub type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

/// Creates the OS threads a pool runs its workers on.
///
/// Implement this to control names, stack sizes, or to register threads
/// with an external registry before they start.
pub trait ThreadFactory: Send + Sync {
    /// Spawns a thread running `body`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created; the pool
    /// turns it into [`SubmitError::Spawn`](crate::SubmitError::Spawn).
    fn new_thread(&self, body: WorkerBody) -> io::Result<thread::JoinHandle<()>>;
}

/// Factory naming threads `"<prefix>-<n>"` with `n` counting from 1.
///
/// ```rust
/// use workgate::{NamedThreadFactory, ThreadFactory};
///
/// let factory = NamedThreadFactory::new("flush");
/// let handle = factory
///     .new_thread(Box::new(|| {
///         assert_eq!(std::thread::current().name(), Some("flush-1"));
///     }))
///     .unwrap();
/// handle.join().unwrap();
/// ```
pub struct NamedThreadFactory {
    prefix: String,
    stack_size: Option<usize>,
    created: AtomicUsize,
}

impl NamedThreadFactory {
    /// Factory with the given name prefix and the platform default stack.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            stack_size: None,
            created: AtomicUsize::new(0),
        }
    }

    /// Sets the stack size, in bytes, of created threads.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Threads created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl Default for NamedThreadFactory {
    fn default() -> Self {
        Self::new("workgate-worker")
    }
}

impl ThreadFactory for NamedThreadFactory {
    fn new_thread(&self, body: WorkerBody) -> io::Result<thread::JoinHandle<()>> {
        let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        let mut builder = thread::Builder::new().name(format!("{}-{}", self.prefix, n));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn(body)
    }
}

impl fmt::Debug for NamedThreadFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedThreadFactory")
            .field("prefix", &self.prefix)
            .field("stack_size", &self.stack_size)
            .field("created", &self.created())
            .finish()
    }
}
