//! Active/paused attention state

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attention {
    Active,
    Paused,
}

/// A change of [`Attention`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionChange {
    /// No qualifying signal for longer than the idle threshold
    Paused { last_activity_ms: i64 },
    /// First qualifying signal after a pause
    Resumed,
}

/// Tracks the last user activity and decides when the user went idle
#[derive(Debug, Clone)]
pub struct ActivityClock {
    last_activity_ms: i64,
    attention: Attention,
    idle_threshold_ms: i64,
}

impl ActivityClock {
    pub fn new(now_ms: i64, idle_threshold: Duration) -> Self {
        Self {
            last_activity_ms: now_ms,
            attention: Attention::Active,
            idle_threshold_ms: i64::try_from(idle_threshold.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Record a qualifying signal
    pub fn mark_activity(&mut self, now_ms: i64) -> Option<AttentionChange> {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
        match self.attention {
            Attention::Active => None,
            Attention::Paused => {
                self.attention = Attention::Active;
                Some(AttentionChange::Resumed)
            }
        }
    }

    pub fn idle_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_activity_ms).max(0)
    }

    /// Idle check run on every poll tick; pauses at most once per idle stretch
    pub fn poll(&mut self, now_ms: i64) -> Option<AttentionChange> {
        if self.attention == Attention::Active && self.idle_ms(now_ms) > self.idle_threshold_ms {
            self.attention = Attention::Paused;
            return Some(AttentionChange::Paused {
                last_activity_ms: self.last_activity_ms,
            });
        }
        None
    }

    pub fn attention(&self) -> Attention {
        self.attention
    }

    pub fn is_paused(&self) -> bool {
        self.attention == Attention::Paused
    }

    pub fn last_activity_ms(&self) -> i64 {
        self.last_activity_ms
    }
}
