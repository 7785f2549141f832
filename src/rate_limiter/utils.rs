//! # Utility Functions (utils.rs)
//!
//! Time source and cache-line helpers shared by the limiter.
//!
//! ```text
//!     Time Base:
//!
//!     process start ──► capture (Instant, epoch ms) once
//!     every call    ──► epoch ms + Instant::elapsed()
//!
//!     Result: millisecond timestamps that never jump backwards,
//!     even if the wall clock is adjusted while we run.
//! ```

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Cache line size for x86_64 processors (Intel/AMD).
#[cfg(target_arch = "x86_64")]
pub(crate) const CACHE_LINE_SIZE: usize = 64;

/// Cache line size for ARM64 processors.
///
/// Many ARM processors use 128-byte cache lines.
#[cfg(target_arch = "aarch64")]
pub(crate) const CACHE_LINE_SIZE: usize = 128;

/// Default cache line size for other architectures.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) const CACHE_LINE_SIZE: usize = 64;

// Wall-clock epoch milliseconds captured once, advanced by a monotonic Instant.
static START_TIME_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Returns the current time in milliseconds since UNIX epoch.
///
/// The value is monotonic for the life of the process, which is what the
/// window arithmetic in the limiter relies on: `now - last_allowed` can never
/// underflow because of a clock step.
///
/// # Example
///
/// ```rust
/// use workgate::current_time_ms;
///
/// let before = current_time_ms();
/// let after = current_time_ms();
/// assert!(after >= before);
/// ```
#[inline(always)]
pub fn current_time_ms() -> u64 {
    let (start, base_ms) = START_TIME_BASE.get_or_init(|| {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        (Instant::now(), epoch_ms)
    });
    base_ms.saturating_add(start.elapsed().as_millis() as u64)
}

/// Cache-aligned wrapper for values to prevent false sharing.
///
/// The limiter's admission counter is bumped by every caller thread, while
/// the tracked-key count is touched only when a key is first seen. Keeping
/// them on separate cache lines stops the hot counter from invalidating the
/// cold one.
#[cfg(target_arch = "x86_64")]
#[repr(C, align(64))]
pub(crate) struct CacheAligned<T>(pub T);
#[cfg(target_arch = "aarch64")]
#[repr(C, align(128))]
pub(crate) struct CacheAligned<T>(pub T);
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[repr(C, align(64))]
pub(crate) struct CacheAligned<T>(pub T);

const _: () = assert!(std::mem::align_of::<CacheAligned<u8>>() == CACHE_LINE_SIZE);

impl<T> CacheAligned<T> {
    /// Creates a new cache-aligned value.
    #[inline(always)]
    pub(crate) const fn new(value: T) -> Self {
        Self(value)
    }

    /// Gets a reference to the inner value.
    #[inline(always)]
    pub(crate) fn get(&self) -> &T {
        &self.0
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CacheAligned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
