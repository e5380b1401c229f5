//! Metrics hooks for Bloom filter operations
//!
//! Filters built with `with_metrics` report their sizing once at
//! construction and every `add`, `check` and `union` afterwards.
//!
//! ## Usage
//!
//! ```ignore
//! use packed_bloom::{BloomFilter, Metrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(Metrics::new());
//! let mut filter = BloomFilter::new(1000, 1024)?.with_metrics(metrics.clone());
//! filter.add(b"element");
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::SizingParams;

/// Bytes held by one storage word
const WORD_BYTES: u64 = 4;

/// Metrics collector for Bloom filter operations
///
/// Thread-safe counters, shareable between filters.
#[derive(Default)]
pub struct Metrics {
    /// Filters created
    pub filters_created: AtomicU64,
    /// Filters whose derived hash count was raised to the minimum
    pub filters_clamped: AtomicU64,
    /// Bytes of word storage across all filters (`num_words * 4`)
    pub bytes_allocated: AtomicU64,
    /// Bit positions written, `num_hashes` per `add`
    pub positions_set: AtomicU64,
    /// `add` calls across all filters
    pub elements_added: AtomicU64,
    /// `check` calls
    pub checks_performed: AtomicU64,
    /// Checks answering true (true or false positives)
    pub checks_positive: AtomicU64,
    /// Filter unions
    pub filters_merged: AtomicU64,
    /// Cumulative check time in nanoseconds
    pub check_time_ns: AtomicU64,
    /// Cumulative add time in nanoseconds
    pub add_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let elements_added = self.elements_added.load(Ordering::Relaxed);
        let checks_performed = self.checks_performed.load(Ordering::Relaxed);
        MetricsSnapshot {
            filters_created: self.filters_created.load(Ordering::Relaxed),
            filters_clamped: self.filters_clamped.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            positions_set: self.positions_set.load(Ordering::Relaxed),
            elements_added,
            checks_performed,
            checks_positive: self.checks_positive.load(Ordering::Relaxed),
            filters_merged: self.filters_merged.load(Ordering::Relaxed),
            avg_check_ns: average(self.check_time_ns.load(Ordering::Relaxed), checks_performed),
            avg_add_ns: average(self.add_time_ns.load(Ordering::Relaxed), elements_added),
        }
    }
}

fn average(total: u64, count: u64) -> u64 {
    if count > 0 {
        total / count
    } else {
        0
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub filters_created: u64,
    pub filters_clamped: u64,
    pub bytes_allocated: u64,
    pub positions_set: u64,
    pub elements_added: u64,
    pub checks_performed: u64,
    pub checks_positive: u64,
    pub filters_merged: u64,
    pub avg_check_ns: u64,
    pub avg_add_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this to forward filter activity to an external metrics system.
pub trait MetricsRecorder: Send + Sync {
    /// Called once when a recorder is attached to a filter
    fn record_filter_created(&self, params: &SizingParams);

    /// Called after `add` has set all `num_hashes` positions
    fn record_add(&self, num_hashes: u32, duration: Duration);

    /// `found` is the filter's answer, possibly a false positive
    fn record_check(&self, duration: Duration, found: bool);

    fn record_union(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_filter_created(&self, _: &SizingParams) {}
    fn record_add(&self, _: u32, _: Duration) {}
    fn record_check(&self, _: Duration, _: bool) {}
    fn record_union(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_filter_created(&self, params: &SizingParams) {
        self.filters_created.fetch_add(1, Ordering::Relaxed);
        if params.hashes_clamped {
            self.filters_clamped.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_allocated
            .fetch_add(params.num_words as u64 * WORD_BYTES, Ordering::Relaxed);
    }

    fn record_add(&self, num_hashes: u32, duration: Duration) {
        self.elements_added.fetch_add(1, Ordering::Relaxed);
        self.positions_set
            .fetch_add(u64::from(num_hashes), Ordering::Relaxed);
        self.add_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn record_check(&self, duration: Duration, found: bool) {
        self.checks_performed.fetch_add(1, Ordering::Relaxed);
        self.check_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if found {
            self.checks_positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_union(&self) {
        self.filters_merged.fetch_add(1, Ordering::Relaxed);
    }
}
