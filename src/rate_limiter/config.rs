//! # Rate Limiter Configuration
//!
//! Settings for the keyed, windowed limiter. Two numbers describe it fully:
//!
//! ```text
//!     window_ms ─────► how long a key stays quiet after an admitted event
//!     max_keys  ─────► how many distinct keys are tracked at most
//!
//!     key A:  ✅ ❌ ❌ ❌ ❌ │ ✅ ❌ ❌
//!             └── window ──┘└── window ──
//! ```

use crate::error::ConfigError;

/// Default window: one admitted event per key every five seconds.
pub const DEFAULT_WINDOW_MS: u64 = 5_000;

/// Default cap on distinct tracked keys.
pub const DEFAULT_MAX_KEYS: usize = 10_000;

/// Configuration for [`RateLimiter`](crate::RateLimiter) instances.
///
/// ## Examples
///
/// ```rust
/// use workgate::RateLimiterConfig;
///
/// // One event per key every 5 seconds, up to 100 keys
/// let config = RateLimiterConfig::new(5_000, 100);
/// assert!(config.validate().is_ok());
///
/// // One event per key per minute
/// let config = RateLimiterConfig::per_minute().with_max_keys(1_000);
/// assert_eq!(config.window_ms, 60_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Length of the per-key window in milliseconds.
    ///
    /// The window starts at the last admitted event for the key, not at a
    /// calendar boundary.
    pub window_ms: u64,

    /// Maximum number of distinct keys tracked simultaneously.
    ///
    /// Keys first seen while the map is full are admitted without tracking.
    pub max_keys: usize,
}

impl Default for RateLimiterConfig {
    /// 5 second window, 10,000 tracked keys.
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl RateLimiterConfig {
    /// Creates a configuration with the given window and key cap.
    pub fn new(window_ms: u64, max_keys: usize) -> Self {
        Self { window_ms, max_keys }
    }

    /// One admitted event per key per second.
    pub fn per_second() -> Self {
        Self {
            window_ms: 1_000,
            ..Default::default()
        }
    }

    /// One admitted event per key per minute.
    pub fn per_minute() -> Self {
        Self {
            window_ms: 60_000,
            ..Default::default()
        }
    }

    /// Sets the maximum number of tracked keys.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Sets the window length in milliseconds.
    pub fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroWindow`] if `window_ms` is 0
    /// - [`ConfigError::ZeroMaxKeys`] if `max_keys` is 0
    ///
    /// ```rust
    /// use workgate::{ConfigError, RateLimiterConfig};
    ///
    /// let config = RateLimiterConfig::new(0, 10);
    /// assert_eq!(config.validate(), Err(ConfigError::ZeroWindow));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.max_keys == 0 {
            return Err(ConfigError::ZeroMaxKeys);
        }
        Ok(())
    }

    /// Upper bound on admitted events per second for a single tracked key.
    pub fn max_rate_per_key(&self) -> f64 {
        if self.window_ms == 0 {
            0.0
        } else {
            1000.0 / self.window_ms as f64
        }
    }
}
