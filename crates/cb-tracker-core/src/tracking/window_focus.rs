//! Focused-window time

use crate::model::whole_seconds;

/// Measures contiguous focused time and counts focus losses
#[derive(Debug, Clone, Default)]
pub struct WindowFocusTracker {
    active_since: Option<i64>,
    total_active_ms: i64,
    focus_losses: u64,
    blurred_once: bool,
}

impl WindowFocusTracker {
    /// `has_focus` is whether the window is focused when tracking starts
    pub fn new(now_ms: i64, has_focus: bool) -> Self {
        Self {
            active_since: has_focus.then_some(now_ms),
            ..Self::default()
        }
    }

    /// Window lost focus; returns whole seconds to report, if any
    ///
    /// The first blur only ends the initial interval and is not counted as a switch.
    pub fn on_blur(&mut self, now_ms: i64, paused: bool) -> Option<u64> {
        let start = self.active_since.take()?;

        let mut reported = None;
        if !paused {
            let elapsed = now_ms.saturating_sub(start).max(0);
            self.total_active_ms += elapsed;
            let seconds = whole_seconds(start, now_ms);
            if seconds > 0 {
                reported = Some(seconds);
            }
        }

        if self.blurred_once {
            self.focus_losses += 1;
        }
        self.blurred_once = true;
        reported
    }

    pub fn on_focus(&mut self, now_ms: i64, paused: bool) {
        if !paused && self.active_since.is_none() {
            self.active_since = Some(now_ms);
        }
    }

    /// Idle pause: drop the open interval without crediting it
    pub fn suspend(&mut self) {
        self.active_since = None;
    }

    /// Activity after a pause starts a fresh interval
    pub fn resume(&mut self, now_ms: i64) {
        self.active_since = Some(now_ms);
    }

    pub fn is_accruing(&self) -> bool {
        self.active_since.is_some()
    }

    pub fn focus_loss_count(&self) -> u64 {
        self.focus_losses
    }

    /// Credited focused time, plus the open interval when `now_ms` is given
    pub fn active_ms(&self, now_ms: Option<i64>) -> i64 {
        let open = match (self.active_since, now_ms) {
            (Some(start), Some(now)) => now.saturating_sub(start).max(0),
            _ => 0,
        };
        self.total_active_ms + open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_reports_elapsed_seconds() {
        let mut tracker = WindowFocusTracker::new(0, true);
        assert_eq!(tracker.on_blur(42_500, false), Some(42));
        assert_eq!(tracker.active_ms(None), 42_500);
        assert!(!tracker.is_accruing());
    }

    #[test]
    fn test_first_blur_is_not_a_switch() {
        let mut tracker = WindowFocusTracker::new(0, true);
        tracker.on_blur(1_000, false);
        assert_eq!(tracker.focus_loss_count(), 0);

        tracker.on_focus(2_000, false);
        tracker.on_blur(5_000, false);
        assert_eq!(tracker.focus_loss_count(), 1);
    }

    #[test]
    fn test_sub_second_focus_reports_nothing() {
        let mut tracker = WindowFocusTracker::new(0, true);
        assert_eq!(tracker.on_blur(900, false), None);
        assert_eq!(tracker.active_ms(None), 900);
    }

    #[test]
    fn test_blur_without_focus_is_ignored() {
        let mut tracker = WindowFocusTracker::new(0, false);
        assert_eq!(tracker.on_blur(10_000, false), None);
        assert_eq!(tracker.focus_loss_count(), 0);
    }

    #[test]
    fn test_suspended_time_is_discarded() {
        let mut tracker = WindowFocusTracker::new(0, true);
        tracker.suspend();
        assert_eq!(tracker.on_blur(60_000, true), None);
        assert_eq!(tracker.active_ms(None), 0);

        tracker.resume(100_000);
        assert_eq!(tracker.on_blur(103_000, false), Some(3));
    }

    #[test]
    fn test_focus_ignored_while_paused() {
        let mut tracker = WindowFocusTracker::new(0, false);
        tracker.on_focus(1_000, true);
        assert!(!tracker.is_accruing());
    }
}
