//! Observer counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for observer activity
///
/// Shared between every root's classifier task and the emitter.
#[derive(Debug, Default)]
pub struct ObserverMetrics {
    /// Raw notifications delivered by the native primitive
    notifications: AtomicU64,

    /// Notifications dropped by the ignore policy
    ignored: AtomicU64,

    /// Change events pushed to the output queue
    events_emitted: AtomicU64,

    /// Errors reported on the error channel
    errors: AtomicU64,
}

impl ObserverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> ObserverMetricsSnapshot {
        ObserverMetricsSnapshot {
            notifications: self.notifications.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of observer counters at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverMetricsSnapshot {
    pub notifications: u64,
    pub ignored: u64,
    pub events_emitted: u64,
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = ObserverMetrics::new();
        metrics.record_notification();
        metrics.record_notification();
        metrics.record_ignored();
        metrics.record_event();

        assert_eq!(
            metrics.snapshot(),
            ObserverMetricsSnapshot {
                notifications: 2,
                ignored: 1,
                events_emitted: 1,
                errors: 0,
            }
        );
    }
}
