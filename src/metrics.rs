//! Bounded, process-wide log of endpoint attempts.
//!
//! The recorder only stores; aggregation belongs to consumers.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, OnceLock,
    },
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of metrics retained by default.
pub const DEFAULT_CAPACITY: usize = 1000;

/// One terminal attempt against one endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptMetric {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub endpoint_host: String,
    pub latency_ms: u64,
    /// `0` when no response was received.
    pub status_code: u16,
    /// True when the endpoint was not the primary source.
    pub is_fallback: bool,
    pub method: String,
}

/// Fields of an attempt supplied by the cascade; id and timestamp are
/// assigned on record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    pub endpoint_host: String,
    pub latency_ms: u64,
    pub status_code: u16,
    pub is_fallback: bool,
    pub method: String,
}

/// Append-only attempt log capped at a fixed number of entries.
///
/// Oldest entries are evicted first once the cap is exceeded.
#[derive(Debug)]
pub struct MetricsRecorder {
    entries: Mutex<VecDeque<AttemptMetric>>,
    capacity: usize,
    next_id: AtomicU64,
}

static GLOBAL: OnceLock<Arc<MetricsRecorder>> = OnceLock::new();

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder retaining at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY) + 1)),
            capacity,
            next_id: AtomicU64::new(1),
        }
    }

    /// Process-wide recorder shared by every client that was not given its own.
    pub fn global() -> Arc<MetricsRecorder> {
        GLOBAL
            .get_or_init(|| Arc::new(MetricsRecorder::default()))
            .clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a metric as-is, then trims to the cap.
    pub fn record(&self, metric: AttemptMetric) {
        let mut entries = self.lock();
        entries.push_back(metric);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Stamps an attempt with a fresh id and the current time, then records it.
    pub fn record_attempt(&self, attempt: AttemptRecord) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.record(AttemptMetric {
            id,
            timestamp: Utc::now(),
            endpoint_host: attempt.endpoint_host,
            latency_ms: attempt.latency_ms,
            status_code: attempt.status_code,
            is_fallback: attempt.is_fallback,
            method: attempt.method,
        });
        id
    }

    /// Returns a snapshot of retained metrics, oldest first.
    pub fn list(&self) -> Vec<AttemptMetric> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clears all retained metrics to start a fresh measurement window.
    pub fn reset(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<AttemptMetric>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Snapshot of the process-wide recorder.
pub fn metrics() -> Vec<AttemptMetric> {
    MetricsRecorder::global().list()
}

/// Clears the process-wide recorder.
pub fn reset_metrics() {
    MetricsRecorder::global().reset();
}
