//! Logger metrics for observability
//!
//! Counters for monitoring dispatch health: how many records were queued,
//! delivered, lost to overflow, rejected after shutdown, or failed in a sink.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_async_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_dropped();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.delivered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Units accepted into the queue
    submitted: AtomicU64,

    /// Records handed to every sink (sync or async)
    delivered: AtomicU64,

    /// Records below the threshold at filtering time
    filtered: AtomicU64,

    /// Units rejected by `discard_new`
    dropped: AtomicU64,

    /// Units evicted by `overrun_oldest`
    evicted: AtomicU64,

    /// Submissions refused because the queue was stopped
    rejected: AtomicU64,

    /// Number of times a submission found the queue full
    queue_full_events: AtomicU64,

    /// Number of times a producer blocked waiting for space
    block_events: AtomicU64,

    /// Individual sink write failures (including panics)
    sink_failures: AtomicU64,

    /// Units of work that panicked on a worker thread
    panicked_jobs: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            panicked_jobs: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    /// Units rejected by `discard_new`
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Units evicted by `overrun_oldest`
    #[inline]
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Everything lost to overflow, whichever policy caused it
    #[inline]
    pub fn lost_count(&self) -> u64 {
        self.dropped_count() + self.evicted_count()
    }

    #[inline]
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn panicked_jobs(&self) -> u64 {
        self.panicked_jobs.load(Ordering::Relaxed)
    }

    // The `record_*` methods return the previous value, like `fetch_add`.

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_evicted(&self) -> u64 {
        self.evicted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_panicked_job(&self) -> u64 {
        self.panicked_jobs.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of records lost to overflow, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been submitted or lost yet.
    pub fn drop_rate(&self) -> f64 {
        let lost = self.lost_count() as f64;
        let total = self.submitted_count() as f64 + self.dropped_count() as f64;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        for counter in [
            &self.submitted,
            &self.delivered,
            &self.filtered,
            &self.dropped,
            &self.evicted,
            &self.rejected,
            &self.queue_full_events,
            &self.block_events,
            &self.sink_failures,
            &self.panicked_jobs,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted_count()),
            delivered: AtomicU64::new(self.delivered_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            evicted: AtomicU64::new(self.evicted_count()),
            rejected: AtomicU64::new(self.rejected_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            panicked_jobs: AtomicU64::new(self.panicked_jobs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.submitted_count(), 0);
        assert_eq!(metrics.delivered_count(), 0);
        assert_eq!(metrics.lost_count(), 0);
        assert_eq!(metrics.rejected_count(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_lost_count_combines_policies() {
        let metrics = LoggerMetrics::new();
        metrics.record_dropped();
        metrics.record_evicted();
        metrics.record_evicted();
        assert_eq!(metrics.lost_count(), 3);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_submitted();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }

        // 10 out of 100 = 10%
        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_dropped();
        metrics.record_delivered();
        metrics.record_queue_full();
        metrics.record_panicked_job();

        metrics.reset();

        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.delivered_count(), 0);
        assert_eq!(metrics.queue_full_events(), 0);
        assert_eq!(metrics.panicked_jobs(), 0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_submitted();
        metrics.record_submitted();

        let snapshot = metrics.clone();
        metrics.record_submitted();

        assert_eq!(snapshot.submitted_count(), 2);
        assert_eq!(metrics.submitted_count(), 3);
    }
}
