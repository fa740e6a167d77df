//! Engagement counters published to dashboards

use super::activity::Attention;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    /// Times the window lost focus, not counting the first blur
    pub focus_loss_count: u64,
    /// Focused-window time, the open interval included
    pub window_active_ms: i64,
    pub copy_paste_count: usize,
    pub page_visit_count: usize,
    pub attention: Attention,
}

impl Default for EngagementStats {
    fn default() -> Self {
        Self {
            focus_loss_count: 0,
            window_active_ms: 0,
            copy_paste_count: 0,
            page_visit_count: 0,
            attention: Attention::Active,
        }
    }
}

/// Latest stats plus any number of subscribers
#[derive(Debug)]
pub struct StatsPublisher {
    sender: watch::Sender<EngagementStats>,
}

impl Default for StatsPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(EngagementStats::default());
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<EngagementStats> {
        self.sender.subscribe()
    }

    /// Store `stats`; subscribers are only woken when something changed
    pub fn publish(&self, stats: EngagementStats) {
        self.sender.send_if_modified(|current| {
            if *current == stats {
                false
            } else {
                *current = stats;
                true
            }
        });
    }

    pub fn current(&self) -> EngagementStats {
        *self.sender.borrow()
    }
}
