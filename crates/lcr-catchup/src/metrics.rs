use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for ledger applications.
///
/// Shared through an `Arc` so a metrics exporter can read them while the
/// replayer owns the work.
#[derive(Debug, Default)]
pub struct ApplyMetrics {
    success: AtomicU64,
    failure: AtomicU64,
}

impl ApplyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger was applied and reproduced its archived hash.
    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    /// A ledger failed a continuity or hash check, or failed to apply.
    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ApplyMetricsSnapshot {
        ApplyMetricsSnapshot {
            success: self.success.load(Ordering::Relaxed),
            failure: self.failure.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ApplyMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyMetricsSnapshot {
    pub success: u64,
    pub failure: u64,
}

impl ApplyMetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let metrics = ApplyMetrics::new();
        assert_eq!(metrics.snapshot(), ApplyMetricsSnapshot::default());
    }

    #[test]
    fn counters_increment_independently() {
        let metrics = ApplyMetrics::new();
        metrics.record_success();
        metrics.record_success();
        metrics.record_failure();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.success, 2);
        assert_eq!(snapshot.failure, 1);
        assert_eq!(snapshot.total(), 3);
    }
}
