//! # Rate Limiter Metrics
//!
//! Point-in-time counters for a keyed limiter, plus a coarse health reading
//! that tells you whether the key map is still giving precise limiting.
//!
//! ```text
//!     Metrics Dashboard:
//!     ┌─────────────────────────────────────┐
//!     │  Admitted: 1,204   Suppressed: 88k  │
//!     │  Suppression Rate: 98.6%            │
//!     │                                     │
//!     │  Tracked Keys: 9,950/10,000         │
//!     │  ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓░  (99.5%)      │
//!     │                                     │
//!     │  Health: ⚠️ Degraded                │
//!     └─────────────────────────────────────┘
//! ```

use std::fmt;

/// Fraction of `max_keys` above which the limiter reports `Degraded`.
const NEAR_CAPACITY_RATIO: f64 = 0.9;

/// Snapshot of a [`RateLimiter`](crate::RateLimiter)'s counters.
///
/// ```rust
/// use workgate::RateLimiter;
///
/// let limiter = RateLimiter::new(1_000, 100).unwrap();
/// limiter.is_handleable(&"a");
/// limiter.is_handleable(&"a");
///
/// let metrics = limiter.metrics();
/// assert_eq!(metrics.total_admitted, 1);
/// assert_eq!(metrics.total_suppressed, 1);
/// println!("{}", metrics.summary());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterMetrics {
    /// Events admitted since construction, tracked or not.
    pub total_admitted: u64,

    /// Events suppressed since construction.
    pub total_suppressed: u64,

    /// Admitted events for keys that could not be tracked (map full).
    pub untracked_admissions: u64,

    /// Keys currently tracked.
    pub tracked_keys: usize,

    /// Maximum number of keys that can be tracked.
    pub max_keys: usize,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RateLimiterMetrics {
    /// Total events seen (admitted + suppressed).
    #[inline]
    pub fn total_events(&self) -> u64 {
        self.total_admitted + self.total_suppressed
    }

    /// Fraction of events that were suppressed, 0.0 when nothing was seen.
    #[inline]
    pub fn suppression_rate(&self) -> f64 {
        let total = self.total_events();
        if total == 0 {
            0.0
        } else {
            self.total_suppressed as f64 / total as f64
        }
    }

    /// Fraction of the key map in use (0.0 to 1.0).
    #[inline]
    pub fn capacity_used(&self) -> f64 {
        if self.max_keys == 0 {
            0.0
        } else {
            self.tracked_keys as f64 / self.max_keys as f64
        }
    }

    /// `true` when no further keys can be tracked.
    #[inline]
    pub fn is_at_capacity(&self) -> bool {
        self.tracked_keys >= self.max_keys
    }

    /// Health of the limiter's bookkeeping.
    ///
    /// - **Critical**: new keys have been admitted untracked
    /// - **Degraded**: the map is above 90% of capacity
    /// - **Healthy**: otherwise
    pub fn health_status(&self) -> HealthStatus {
        if self.untracked_admissions > 0 && self.is_at_capacity() {
            HealthStatus::Critical
        } else if self.capacity_used() > NEAR_CAPACITY_RATIO {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        format!(
            "RateLimiter Metrics:\n\
             ├─ Events:\n\
             │  ├─ Admitted: {}\n\
             │  ├─ Suppressed: {}\n\
             │  ├─ Untracked Admissions: {}\n\
             │  └─ Suppression Rate: {:.2}%\n\
             ├─ Keys:\n\
             │  ├─ Tracked: {}/{}\n\
             │  ├─ Capacity Used: {:.2}%\n\
             │  └─ Window: {}ms\n\
             └─ Health:\n\
                └─ Status: {}",
            self.total_admitted,
            self.total_suppressed,
            self.untracked_admissions,
            self.suppression_rate() * 100.0,
            self.tracked_keys,
            self.max_keys,
            self.capacity_used() * 100.0,
            self.window_ms,
            self.health_status(),
        )
    }
}

impl fmt::Display for RateLimiterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Health status of a limiter's key map.
///
/// ```text
///     Healthy ──────► every key is limited precisely
///        │
///     Degraded ─────► map nearly full
///        │
///     Critical ─────► new keys pass through unlimited
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Plenty of room in the key map.
    Healthy,

    /// Key map above 90% of capacity.
    Degraded,

    /// Key map full and new keys are passing through untracked.
    Critical,
}

impl HealthStatus {
    /// Returns true if the status indicates any problems.
    pub fn is_unhealthy(&self) -> bool {
        !matches!(self, Self::Healthy)
    }

    /// Suggested operator action.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            Self::Healthy => "No action needed",
            Self::Degraded => "Monitor closely, consider raising max_keys or purging",
            Self::Critical => "Raise max_keys or purge expired keys: new keys are not limited",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "✅ Healthy"),
            Self::Degraded => write!(f, "⚠️ Degraded"),
            Self::Critical => write!(f, "🔴 Critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RateLimiterMetrics {
        RateLimiterMetrics {
            total_admitted: 20,
            total_suppressed: 80,
            untracked_admissions: 0,
            tracked_keys: 10,
            max_keys: 100,
            window_ms: 5_000,
        }
    }

    #[test]
    fn test_metrics_calculations() {
        let metrics = sample();

        assert_eq!(metrics.total_events(), 100);
        assert_eq!(metrics.suppression_rate(), 0.8);
        assert_eq!(metrics.capacity_used(), 0.1);
        assert!(!metrics.is_at_capacity());
        assert_eq!(metrics.health_status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_health_transitions() {
        let degraded = RateLimiterMetrics {
            tracked_keys: 95,
            ..sample()
        };
        assert_eq!(degraded.health_status(), HealthStatus::Degraded);

        // Full but nothing has slipped through yet
        let full = RateLimiterMetrics {
            tracked_keys: 100,
            ..sample()
        };
        assert_eq!(full.health_status(), HealthStatus::Degraded);

        let critical = RateLimiterMetrics {
            untracked_admissions: 3,
            ..full
        };
        assert_eq!(critical.health_status(), HealthStatus::Critical);
    }

    #[test]
    fn test_edge_cases() {
        let empty = RateLimiterMetrics {
            total_admitted: 0,
            total_suppressed: 0,
            untracked_admissions: 0,
            tracked_keys: 0,
            max_keys: 0,
            window_ms: 1,
        };
        assert_eq!(empty.suppression_rate(), 0.0);
        assert_eq!(empty.capacity_used(), 0.0);
    }

    #[test]
    fn test_health_status_methods() {
        assert!(!HealthStatus::Healthy.is_unhealthy());
        assert!(HealthStatus::Degraded.is_unhealthy());
        assert!(HealthStatus::Critical.is_unhealthy());

        assert_eq!(HealthStatus::Healthy.suggested_action(), "No action needed");
        assert!(HealthStatus::Critical.suggested_action().contains("max_keys"));
        assert!(format!("{}", HealthStatus::Degraded).contains("Degraded"));
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert!(summary.contains("Admitted: 20"));
        assert!(summary.contains("Tracked: 10/100"));
        assert!(summary.contains("Window: 5000ms"));
        assert_eq!(format!("{}", sample()), summary);
    }
}
