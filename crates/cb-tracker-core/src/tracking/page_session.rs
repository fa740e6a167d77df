//! Page (document/tab) sessions

use crate::model::PageVisitRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSession {
    #[default]
    NoSession,
    InSession {
        page_id: String,
        enter_ts: i64,
        last_activity_ts: i64,
    },
}

/// Measures contiguous time on the current page
///
/// A session's duration runs from entering the page to the last activity
/// observed on it, so idle tails are never credited.
#[derive(Debug, Clone, Default)]
pub struct PageSessionTracker {
    session: PageSession,
}

impl PageSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    pub fn current_page(&self) -> Option<&str> {
        match &self.session {
            PageSession::InSession { page_id, .. } => Some(page_id),
            PageSession::NoSession => None,
        }
    }

    /// Qualifying activity on the current page
    pub fn touch(&mut self, now_ms: i64) {
        if let PageSession::InSession {
            last_activity_ts, ..
        } = &mut self.session
        {
            *last_activity_ts = (*last_activity_ts).max(now_ms);
        }
    }

    /// End the current session, if any
    pub fn close(&mut self) -> Option<PageVisitRecord> {
        match std::mem::take(&mut self.session) {
            PageSession::InSession {
                page_id,
                enter_ts,
                last_activity_ts,
            } => Some(PageVisitRecord::close(page_id, enter_ts, last_activity_ts)),
            PageSession::NoSession => None,
        }
    }

    /// Close the current session and open one for `page_id` (or none)
    pub fn switch_to(&mut self, page_id: Option<String>, now_ms: i64) -> Option<PageVisitRecord> {
        let closed = self.close();
        if let Some(page_id) = page_id {
            self.session = PageSession::InSession {
                page_id,
                enter_ts: now_ms,
                last_activity_ts: now_ms,
            };
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_counts_to_last_activity() {
        let mut pages = PageSessionTracker::new();
        assert!(pages.switch_to(Some("A".into()), 0).is_none());
        pages.touch(30_000);
        pages.touch(65_000);

        let visit = pages.switch_to(Some("B".into()), 190_000).unwrap();
        assert_eq!(visit.page_id, "A");
        assert_eq!(visit.leave_ts, 65_000);
        assert_eq!(visit.active_duration_seconds, 65);
        assert_eq!(pages.current_page(), Some("B"));
    }

    #[test]
    fn test_switch_to_nothing_ends_session() {
        let mut pages = PageSessionTracker::new();
        pages.switch_to(Some("A".into()), 1_000);
        let visit = pages.switch_to(None, 2_000).unwrap();
        assert_eq!(visit.active_duration_seconds, 0);
        assert_eq!(pages.session(), &PageSession::NoSession);
        assert!(pages.close().is_none());
    }

    #[test]
    fn test_touch_without_session_is_noop() {
        let mut pages = PageSessionTracker::new();
        pages.touch(5_000);
        assert!(pages.current_page().is_none());
    }
}
