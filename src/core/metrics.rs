//! Logger metrics for observability
//!
//! Counts log calls and what happened to each per-stream dispatch, so a
//! silently failing stream still shows up somewhere.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use structured_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_call();
/// metrics.record_written();
/// metrics.record_failure();
///
/// assert_eq!(metrics.total_calls(), 1);
/// assert_eq!(metrics.failure_count(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Number of log calls
    total_calls: AtomicU64,

    /// Entries persisted by a stream's sink
    written_count: AtomicU64,

    /// Entries a stream's sink rejected with an error or a panic
    failure_count: AtomicU64,

    /// Entries skipped because a stream's match predicate did not match
    filtered_count: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            written_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self) {
        self.written_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed write, returning the previous failure count
    #[inline]
    pub fn record_failure(&self) -> u64 {
        self.failure_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.filtered_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Percentage of attempted writes that failed
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failure_count() as f64;
        let attempted = failed + self.written_count() as f64;
        if attempted == 0.0 {
            0.0
        } else {
            failed / attempted * 100.0
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.total_calls.store(0, Ordering::Relaxed);
        self.written_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.filtered_count.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = LoggerMetrics::new();
        metrics.record_call();
        metrics.record_written();
        metrics.record_written();
        metrics.record_filtered();

        assert_eq!(metrics.total_calls(), 1);
        assert_eq!(metrics.written_count(), 2);
        assert_eq!(metrics.filtered_count(), 1);
        assert_eq!(metrics.failure_count(), 0);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_written();
        }
        for _ in 0..10 {
            metrics.record_failure();
        }

        let rate = metrics.failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_call();
        metrics.record_failure();
        metrics.reset();

        assert_eq!(metrics.total_calls(), 0);
        assert_eq!(metrics.failure_count(), 0);
    }
}
