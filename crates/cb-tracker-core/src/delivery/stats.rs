//! Delivery counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters kept by the log manager
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Batch timers started
    pub timers_armed: Counter,
    /// Batch requests sent
    pub batches_sent: Counter,
    /// Single-record requests sent, retries included
    pub individual_sent: Counter,
    /// Records the collector accepted
    pub delivered: Counter,
    /// Records put back in the queue after a failure
    pub requeued: Counter,
    /// Records given up on
    pub dropped: Counter,
    /// Parent notebooks created by recovery
    pub parents_created: Counter,
}

impl DeliveryStats {
    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            timers_armed: self.timers_armed.get(),
            batches_sent: self.batches_sent.get(),
            individual_sent: self.individual_sent.get(),
            delivered: self.delivered.get(),
            requeued: self.requeued.get(),
            dropped: self.dropped.get(),
            parents_created: self.parents_created.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatsSnapshot {
    pub timers_armed: u64,
    pub batches_sent: u64,
    pub individual_sent: u64,
    pub delivered: u64,
    pub requeued: u64,
    pub dropped: u64,
    pub parents_created: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = DeliveryStats::default();
        stats.batches_sent.inc();
        stats.delivered.inc_by(50);
        stats.dropped.inc();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.batches_sent, 1);
        assert_eq!(snapshot.delivered, 50);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.timers_armed, 0);
    }
}
