//! In-memory record logs shared by the trackers
//!
//! Lifecycle: created when tracking starts, drained per notebook as cell logs are
//! handed to delivery, disposed at teardown. After disposal appends are
//! ignored and the logs stay readable.

use crate::model::{CellVisitRecord, ClipboardAction, CopyPasteRecord, PageVisitRecord, SourceType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Point-in-time copy of every log, used for exports and dashboards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub page_visits: Vec<PageVisitRecord>,
    pub cell_visits: Vec<CellVisitRecord>,
    pub copy_paste: Vec<CopyPasteRecord>,
}

/// Copy/paste counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPasteCounts {
    pub total_events: usize,
    pub total_copies: usize,
    pub total_pastes: usize,
    pub internal_pastes: usize,
    pub external_pastes: usize,
}

impl CopyPasteCounts {
    pub fn from_records(records: &[CopyPasteRecord]) -> Self {
        let mut counts = Self {
            total_events: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.action {
                ClipboardAction::Copy => counts.total_copies += 1,
                ClipboardAction::Paste => {
                    counts.total_pastes += 1;
                    match record.source_type {
                        SourceType::Internal => counts.internal_pastes += 1,
                        SourceType::External => counts.external_pastes += 1,
                        SourceType::Unknown => {}
                    }
                }
            }
        }
        counts
    }
}

#[derive(Debug, Default)]
pub struct LogStore {
    page_visits: Vec<PageVisitRecord>,
    cell_visits: Vec<CellVisitRecord>,
    copy_paste: Vec<CopyPasteRecord>,
    disposed: bool,
}

impl LogStore {
    pub fn init() -> Self {
        Self::default()
    }

    pub fn push_page_visit(&mut self, visit: PageVisitRecord) {
        if self.reject_after_dispose("page visit") {
            return;
        }
        self.page_visits.push(visit);
    }

    pub fn push_cell_visit(&mut self, visit: CellVisitRecord) {
        if self.reject_after_dispose("cell visit") {
            return;
        }
        self.cell_visits.push(visit);
    }

    pub fn push_copy_paste(&mut self, record: CopyPasteRecord) {
        if self.reject_after_dispose("copy/paste") {
            return;
        }
        self.copy_paste.push(record);
    }

    /// Remove and return the cell visits recorded for one notebook, in order
    pub fn drain_cells_for(&mut self, notebook_id: &str) -> Vec<CellVisitRecord> {
        let (drained, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.cell_visits)
            .into_iter()
            .partition(|visit| visit.notebook_id == notebook_id);
        self.cell_visits = kept;
        drained
    }

    /// Remove and return every cell visit still held
    pub fn take_cell_visits(&mut self) -> Vec<CellVisitRecord> {
        std::mem::take(&mut self.cell_visits)
    }

    pub fn page_visits(&self) -> &[PageVisitRecord] {
        &self.page_visits
    }

    pub fn cell_visits(&self) -> &[CellVisitRecord] {
        &self.cell_visits
    }

    pub fn copy_paste(&self) -> &[CopyPasteRecord] {
        &self.copy_paste
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            page_visits: self.page_visits.clone(),
            cell_visits: self.cell_visits.clone(),
            copy_paste: self.copy_paste.clone(),
        }
    }

    /// Final teardown; the logs stay readable but accept no more records
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn reject_after_dispose(&self, what: &str) -> bool {
        if self.disposed {
            warn!(kind = what, "record dropped: log store already disposed");
        }
        self.disposed
    }
}
