//! Cell sessions, one open cell per notebook

use super::events::CellRef;
use crate::model::CellVisitRecord;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenCell {
    cell_id: String,
    cell_index: i64,
    enter_ts: i64,
}

/// Measures contiguous time on the active cell of each open notebook
///
/// Closed cells are only recorded here; they are uploaded in batch when their
/// notebook's page session closes or at teardown.
#[derive(Debug, Clone, Default)]
pub struct CellSessionTracker {
    open: HashMap<String, OpenCell>,
}

impl CellSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active cell changed in `notebook_id`
    pub fn switch(
        &mut self,
        notebook_id: &str,
        cell: Option<CellRef>,
        now_ms: i64,
    ) -> Option<CellVisitRecord> {
        let closed = self.close(notebook_id, now_ms);
        if let Some(cell) = cell {
            self.open.insert(
                notebook_id.to_string(),
                OpenCell {
                    cell_id: cell.id,
                    cell_index: cell.index,
                    enter_ts: now_ms,
                },
            );
        }
        closed
    }

    /// Close the open cell of one notebook, e.g. when its document is disposed
    pub fn close(&mut self, notebook_id: &str, now_ms: i64) -> Option<CellVisitRecord> {
        self.open.remove(notebook_id).map(|cell| {
            CellVisitRecord::close(notebook_id, cell.cell_id, cell.cell_index, cell.enter_ts, now_ms)
        })
    }

    /// Close every open cell, ordered by notebook id
    pub fn close_all(&mut self, now_ms: i64) -> Vec<CellVisitRecord> {
        let mut notebooks: Vec<String> = self.open.keys().cloned().collect();
        notebooks.sort();
        notebooks
            .iter()
            .filter_map(|notebook_id| self.close(notebook_id, now_ms))
            .collect()
    }

    pub fn active_cell(&self, notebook_id: &str) -> Option<&str> {
        self.open.get(notebook_id).map(|cell| cell.cell_id.as_str())
    }

    /// Seconds spent so far in the open cell of `notebook_id`
    pub fn open_seconds(&self, notebook_id: &str, now_ms: i64) -> u64 {
        self.open
            .get(notebook_id)
            .map(|cell| crate::model::whole_seconds(cell.enter_ts, now_ms))
            .unwrap_or(0)
    }
}
