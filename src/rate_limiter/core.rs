//! # Core Keyed Rate Limiter
//!
//! This module implements a per-key, event-triggered window: the first event
//! for a key is admitted, every further event inside the window is suppressed
//! and counted, and the first event after the window reopens the key.
//!
//! ## Per-Key State Machine
//!
//! ```text
//!                 admitted
//!     ┌──────┐ ────────────► ┌─────────────┐
//!     │ Open │               │ Suppressing │ ──┐ denied,
//!     └──────┘ ◄──────────── └─────────────┘ ◄─┘ count += 1
//!               now - last_allowed >= window
//! ```
//!
//! ## Bounded Memory
//!
//! ```text
//!     key seen before?  ──Yes──► window logic above
//!           │
//!           No
//!           ▼
//!     map below max_keys? ──Yes──► track it, admit
//!           │
//!           No
//!           ▼
//!     admit, do not track (pass-through)
//! ```
//!
//! The map never evicts to make room. Once it is full, precision for new keys
//! is traded for a hard memory bound, and callers are never blocked or failed.
//!
//! ## Atomicity
//!
//! The decision for a key and the mutation of its entry happen under the
//! owning DashMap shard's write lock, so two callers racing on the same key
//! can never both be admitted inside one window.

use super::{
    config::RateLimiterConfig,
    metrics::RateLimiterMetrics,
    utils::{current_time_ms, CacheAligned},
};
use crate::error::ConfigError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on shards, independent of core count.
const MAX_SHARDS: usize = 64;

/// Per-key mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyState {
    /// Timestamp (ms) of the last admitted event.
    pub(crate) last_allowed_ms: u64,
    /// Events denied since the last admission.
    pub(crate) suppressed: u64,
}

/// Outcome of a single [`RateLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The event is admitted and the key is tracked.
    ///
    /// `suppressed` is the number of events denied for this key between the
    /// previous admission and this one.
    Admitted {
        /// Events suppressed since the previous admission.
        suppressed: u64,
    },

    /// The event is admitted but not tracked because the key map is full.
    Untracked,

    /// The event is denied. `count` is the suppressed total for the current
    /// window, including this event.
    Suppressed {
        /// Suppressed events in the current window.
        count: u64,
    },
}

impl Decision {
    /// Returns `true` if the event may be handled now.
    #[inline]
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Self::Suppressed { .. })
    }

    /// Number of earlier events this admission stands in for.
    #[inline]
    pub fn suppressed_before(&self) -> u64 {
        match self {
            Self::Admitted { suppressed } => *suppressed,
            _ => 0,
        }
    }
}

/// Keyed, time-windowed admission gate.
///
/// ## Example
///
/// ```rust
/// use workgate::RateLimiter;
///
/// let limiter = RateLimiter::new(5_000, 10).unwrap();
///
/// assert!(limiter.is_handleable(&"replica-3 unreachable"));
/// assert!(!limiter.is_handleable(&"replica-3 unreachable"));
/// assert_eq!(limiter.num_suppressed_msgs(&"replica-3 unreachable"), 1);
///
/// // A different key has its own window
/// assert!(limiter.is_handleable(&"replica-4 unreachable"));
/// assert_eq!(limiter.limited_message_count(), 2);
/// ```
///
/// ## Thread Safety
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct RateLimiter<K> {
    /// Tracked keys. Never holds more than `max_keys` entries.
    entries: DashMap<K, KeyState, ahash::RandomState>,

    /// Slots reserved in `entries`, checked before inserting.
    tracked: AtomicUsize,

    /// Cumulative admitted events, tracked and untracked.
    admitted: CacheAligned<AtomicU64>,

    /// Cumulative suppressed events.
    suppressed: AtomicU64,

    /// Events admitted without tracking because the map was full.
    untracked: AtomicU64,

    /// Set once the first time the map fills, so the warning fires once.
    saturation_reported: AtomicBool,

    window_ms: u64,
    max_keys: usize,
}

impl<K> RateLimiter<K>
where
    K: Hash + Eq,
{
    /// Creates a limiter admitting one event per key every `window_ms`
    /// milliseconds, tracking at most `max_keys` keys.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either argument is zero.
    pub fn new(window_ms: u64, max_keys: usize) -> Result<Self, ConfigError> {
        Self::with_config(RateLimiterConfig::new(window_ms, max_keys))
    }

    /// Creates a limiter from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn with_config(config: RateLimiterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let num_shards = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8)
            .next_power_of_two()
            .clamp(2, MAX_SHARDS);

        // Pre-size modestly; a huge max_keys should not allocate up front.
        let initial_capacity = config.max_keys.min(1024);

        Ok(Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                initial_capacity,
                ahash::RandomState::new(),
                num_shards,
            ),
            tracked: AtomicUsize::new(0),
            admitted: CacheAligned::new(AtomicU64::new(0)),
            suppressed: AtomicU64::new(0),
            untracked: AtomicU64::new(0),
            saturation_reported: AtomicBool::new(false),
            window_ms: config.window_ms,
            max_keys: config.max_keys,
        })
    }

    /// Returns `true` if an event for `key` may be handled now.
    ///
    /// Denied events are counted against the key. This never blocks on
    /// anything but the key's own shard and never fails.
    #[inline]
    pub fn is_handleable(&self, key: &K) -> bool
    where
        K: Clone,
    {
        self.check(key).is_admitted()
    }

    /// Records an event for `key` and returns the full decision.
    pub fn check(&self, key: &K) -> Decision
    where
        K: Clone,
    {
        self.check_at(key, current_time_ms())
    }

    /// Decision logic against an explicit timestamp.
    pub(crate) fn check_at(&self, key: &K, now_ms: u64) -> Decision
    where
        K: Clone,
    {
        // Fast path: known key, decide under the shard write lock
        if let Some(mut entry) = self.entries.get_mut(key) {
            return self.decide(&mut *entry, now_ms);
        }

        if self.tracked.load(Ordering::Acquire) >= self.max_keys {
            return self.pass_through();
        }

        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                // Another thread inserted it between our lookup and now
                self.decide(occupied.get_mut(), now_ms)
            }
            Entry::Vacant(vacant) => {
                // Reserve a slot; the counter never goes past max_keys
                let reserved = self
                    .tracked
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.max_keys).then_some(n + 1)
                    });
                if reserved.is_err() {
                    return self.pass_through();
                }

                vacant.insert(KeyState {
                    last_allowed_ms: now_ms,
                    suppressed: 0,
                });
                self.admitted.get().fetch_add(1, Ordering::Relaxed);
                Decision::Admitted { suppressed: 0 }
            }
        }
    }

    #[inline]
    fn decide(&self, entry: &mut KeyState, now_ms: u64) -> Decision {
        if now_ms.saturating_sub(entry.last_allowed_ms) >= self.window_ms {
            let suppressed = entry.suppressed;
            entry.last_allowed_ms = now_ms;
            entry.suppressed = 0;
            self.admitted.get().fetch_add(1, Ordering::Relaxed);
            Decision::Admitted { suppressed }
        } else {
            entry.suppressed += 1;
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            Decision::Suppressed {
                count: entry.suppressed,
            }
        }
    }

    fn pass_through(&self) -> Decision {
        if !self.saturation_reported.swap(true, Ordering::Relaxed) {
            warn!(
                "Rate limiter key map full ({} keys), admitting new keys untracked",
                self.max_keys
            );
        }
        self.untracked.fetch_add(1, Ordering::Relaxed);
        self.admitted.get().fetch_add(1, Ordering::Relaxed);
        Decision::Untracked
    }

    /// Suppressed count for `key` in its current window (0 if untracked).
    pub fn num_suppressed_msgs<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|e| e.suppressed).unwrap_or(0)
    }

    /// Returns `true` if `key` currently has an entry.
    pub fn is_tracked<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Drops the entry for `key`, returning its suppressed count if present.
    ///
    /// The next event for the key is admitted.
    pub fn remove<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (_, entry) = self.entries.remove(key)?;
        self.tracked.fetch_sub(1, Ordering::AcqRel);
        Some(entry.suppressed)
    }

    /// Removes entries whose window has elapsed.
    ///
    /// Such a key would be admitted on its next event anyway; the only state
    /// lost is the suppressed count that admission would have reported.
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(current_time_ms())
    }

    pub(crate) fn purge_expired_at(&self, now_ms: u64) -> usize {
        let mut removed = 0;
        let mut dropped_suppressed = 0;

        self.entries.retain(|_, entry| {
            if now_ms.saturating_sub(entry.last_allowed_ms) >= self.window_ms {
                removed += 1;
                dropped_suppressed += entry.suppressed;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            // Slots go back only once the entries are gone from their shards
            self.tracked.fetch_sub(removed, Ordering::AcqRel);
            // Room again for new keys; re-arm the saturation warning
            self.saturation_reported.store(false, Ordering::Relaxed);
            debug!(
                "Purged {} expired keys ({} suppressed events dropped)",
                removed, dropped_suppressed
            );
        }
        removed
    }

    /// Removes every tracked key. Cumulative counters are kept.
    ///
    /// Safe to call while other threads check and remove keys: each removed
    /// entry returns exactly the slot it reserved, so the key cap holds
    /// throughout.
    pub fn clear(&self) {
        let mut count = 0;
        self.entries.retain(|_, _| {
            count += 1;
            false
        });
        if count > 0 {
            self.tracked.fetch_sub(count, Ordering::AcqRel);
        }
        self.saturation_reported.store(false, Ordering::Relaxed);
        info!("Cleared {} rate limiter keys", count);
    }

    /// Snapshot of the limiter's counters.
    pub fn metrics(&self) -> RateLimiterMetrics {
        RateLimiterMetrics {
            total_admitted: self.limited_message_count(),
            total_suppressed: self.suppressed.load(Ordering::Relaxed),
            untracked_admissions: self.untracked.load(Ordering::Relaxed),
            tracked_keys: self.map_size(),
            max_keys: self.max_keys,
            window_ms: self.window_ms,
        }
    }
}

impl<K> RateLimiter<K>
where
    K: Hash + Eq + Send + Sync + 'static,
{
    /// Starts a thread that calls [`purge_expired`](Self::purge_expired)
    /// every `interval` until a value is sent on the returned channel (or the
    /// sender is dropped).
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use workgate::RateLimiter;
    ///
    /// let limiter = Arc::new(RateLimiter::<u64>::new(1_000, 100).unwrap());
    /// let (handle, stop_tx) = limiter
    ///     .clone()
    ///     .start_stoppable_purge_thread(Duration::from_millis(250))
    ///     .unwrap();
    ///
    /// stop_tx.send(()).unwrap();
    /// handle.join().unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start_stoppable_purge_thread(
        self: Arc<Self>,
        interval: Duration,
    ) -> std::io::Result<(thread::JoinHandle<()>, mpsc::Sender<()>)> {
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("workgate-purge".to_string())
            .spawn(move || {
                info!("Started purge thread (interval: {:?})", interval);

                loop {
                    match stop_rx.recv_timeout(interval) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                            info!("Purge thread stopping");
                            break;
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            self.purge_expired();
                        }
                    }
                }
            })?;

        Ok((handle, stop_tx))
    }
}

impl<K: Hash + Eq> RateLimiter<K> {
    /// Cumulative admitted events since construction, across all keys,
    /// including untracked pass-throughs.
    #[inline]
    pub fn limited_message_count(&self) -> u64 {
        self.admitted.get().load(Ordering::Relaxed)
    }

    /// Number of keys currently tracked.
    #[inline]
    pub fn map_size(&self) -> usize {
        self.entries.len()
    }

    /// Configured window in milliseconds.
    #[inline]
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Configured key cap.
    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }
}

impl<K: Hash + Eq> fmt::Debug for RateLimiter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("window_ms", &self.window_ms)
            .field("max_keys", &self.max_keys)
            .field("tracked_keys", &self.entries.len())
            .field("admitted", &self.limited_message_count())
            .finish()
    }
}
