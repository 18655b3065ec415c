//! Metrics collection for mailroom.
//!
//! Provides application-level counters for the email job lifecycle. The
//! collector is injected as an `Arc<Metrics>` into every component that
//! reports events; nothing in the pipeline depends on its representation.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Application metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    // === Job Lifecycle Metrics ===
    /// Jobs accepted into the queue.
    pub emails_enqueued: AtomicU64,
    /// Jobs delivered successfully.
    pub emails_processed: AtomicU64,
    /// Delivery attempts that failed (including attempts that were retried).
    pub emails_failed: AtomicU64,
    /// Jobs re-enqueued for another attempt.
    pub emails_retried: AtomicU64,
    /// Jobs moved to the dead-letter sink.
    pub emails_dead_lettered: AtomicU64,

    // === Queue Metrics ===
    /// Jobs currently buffered in the queue.
    pub queue_depth: AtomicU64,

    // === Processing Metrics ===
    /// Total delivery attempt time in microseconds.
    pub processing_time_us_total: AtomicU64,
    /// Attempt count for average calculation.
    pub processing_count: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            emails_enqueued: AtomicU64::new(0),
            emails_processed: AtomicU64::new(0),
            emails_failed: AtomicU64::new(0),
            emails_retried: AtomicU64::new(0),
            emails_dead_lettered: AtomicU64::new(0),
            queue_depth: AtomicU64::new(0),
            processing_time_us_total: AtomicU64::new(0),
            processing_count: AtomicU64::new(0),
        }
    }

    /// Record a job accepted into the queue.
    pub fn record_enqueued(&self) {
        self.emails_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one delivery attempt.
    pub fn record_attempt(&self, duration: Duration, success: bool) {
        if success {
            self.emails_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.emails_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.processing_time_us_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.processing_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an enqueue that failed at the gateway.
    pub fn record_enqueue_failed(&self) {
        self.emails_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job scheduled for another attempt.
    pub fn record_retried(&self) {
        self.emails_retried.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job moved to the dead-letter sink.
    pub fn record_dead_lettered(&self) {
        self.emails_dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    /// Track a job entering the queue buffer.
    pub fn queue_depth_inc(&self) {
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    /// Track a job leaving the queue buffer.
    pub fn queue_depth_dec(&self) {
        // Saturating: the redis backend may be drained by another consumer
        // between our seed and our first pop.
        let _ = self
            .queue_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |depth| {
                depth.checked_sub(1)
            });
    }

    /// Seed the depth gauge, e.g. from a persisted backlog at startup.
    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            emails_enqueued: self.emails_enqueued.load(Ordering::Relaxed),
            emails_processed: self.emails_processed.load(Ordering::Relaxed),
            emails_failed: self.emails_failed.load(Ordering::Relaxed),
            emails_retried: self.emails_retried.load(Ordering::Relaxed),
            emails_dead_lettered: self.emails_dead_lettered.load(Ordering::Relaxed),
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            processing_avg_time_us: self.average_processing_time_us(),
        }
    }

    /// Calculate average delivery attempt time.
    fn average_processing_time_us(&self) -> u64 {
        let total = self.processing_time_us_total.load(Ordering::Relaxed);
        let count = self.processing_count.load(Ordering::Relaxed);
        if count > 0 { total / count } else { 0 }
    }
}

/// Point-in-time view of all metrics, suitable for the `/metrics` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub emails_enqueued: u64,
    pub emails_processed: u64,
    pub emails_failed: u64,
    pub emails_retried: u64,
    pub emails_dead_lettered: u64,
    pub queue_depth: u64,
    pub processing_avg_time_us: u64,
}
