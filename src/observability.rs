//! Logging setup and ledger counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding apps)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters for ledger activity
#[derive(Debug, Default)]
pub struct Metrics {
    records_added: AtomicU64,
    records_removed: AtomicU64,
    refreshes_attempted: AtomicU64,
    refreshes_failed: AtomicU64,
    orphaned_payloads: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_added(&self) {
        self.records_added.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "records_added", "Metric incremented");
    }

    pub fn record_removed(&self) {
        self.records_removed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "records_removed", "Metric incremented");
    }

    pub fn refresh_attempted(&self) {
        self.refreshes_attempted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "refreshes_attempted", "Metric incremented");
    }

    pub fn refresh_failed(&self) {
        self.refreshes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "refreshes_failed", "Metric incremented");
    }

    pub fn orphaned_payload(&self) {
        self.orphaned_payloads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "orphaned_payloads", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_added: self.records_added.load(Ordering::Relaxed),
            records_removed: self.records_removed.load(Ordering::Relaxed),
            refreshes_attempted: self.refreshes_attempted.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            orphaned_payloads: self.orphaned_payloads.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_added: u64,
    pub records_removed: u64,
    pub refreshes_attempted: u64,
    pub refreshes_failed: u64,
    pub orphaned_payloads: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.record_added();
        metrics.record_added();
        metrics.refresh_attempted();
        metrics.refresh_failed();
        metrics.orphaned_payload();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_added, 2);
        assert_eq!(snapshot.records_removed, 0);
        assert_eq!(snapshot.refreshes_attempted, 1);
        assert_eq!(snapshot.refreshes_failed, 1);
        assert_eq!(snapshot.orphaned_payloads, 1);
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing("debug");
        init_tracing("not a [valid filter");
    }
}
