use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks what happened to incoming events.
///
/// Clones share the same counters, so the bus and the synchronizer can
/// each hold one.
#[derive(Clone, Default)]
pub struct SyncMetrics {
    /// Events whose patch was written to a device
    applied: Arc<AtomicU64>,

    /// Events for a uuid absent from the registry
    discarded_not_found: Arc<AtomicU64>,

    /// Events whose patch does not match the target's device type
    discarded_kind_mismatch: Arc<AtomicU64>,

    /// Messages that failed to decode at the bus boundary
    rejected: Arc<AtomicU64>,

    /// Epoch millis of the last applied patch (0 = never)
    last_applied_ms: Arc<AtomicI64>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub applied: u64,
    pub discarded_not_found: u64,
    pub discarded_kind_mismatch: u64,
    pub rejected: u64,
    pub last_applied_at: Option<DateTime<Utc>>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        self.last_applied_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.discarded_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_kind_mismatch(&self) {
        self.discarded_kind_mismatch.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let last_ms = self.last_applied_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            discarded_not_found: self.discarded_not_found.load(Ordering::Relaxed),
            discarded_kind_mismatch: self.discarded_kind_mismatch.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            last_applied_at: if last_ms > 0 {
                DateTime::from_timestamp_millis(last_ms)
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let snapshot = SyncMetrics::new().snapshot();
        assert_eq!(snapshot.applied, 0);
        assert_eq!(snapshot.rejected, 0);
        assert!(snapshot.last_applied_at.is_none());
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SyncMetrics::new();
        let clone = metrics.clone();

        clone.record_applied();
        clone.record_not_found();
        metrics.record_kind_mismatch();
        metrics.record_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.applied, 1);
        assert_eq!(snapshot.discarded_not_found, 1);
        assert_eq!(snapshot.discarded_kind_mismatch, 1);
        assert_eq!(snapshot.rejected, 1);
        assert!(snapshot.last_applied_at.is_some());
    }
}
