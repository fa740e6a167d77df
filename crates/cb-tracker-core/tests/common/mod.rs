//! In-memory collector shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cb_tracker_core::error::{CollectorErrorCode, TrackerError, TrackerResult};
use cb_tracker_core::model::{LogRecord, NotebookInfo};
use cb_tracker_core::remote::{BatchSummary, ItemResult, RemoteLogService};
use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct Inner {
    notebooks: HashSet<String>,
    accepted: Vec<LogRecord>,
    batch_sizes: Vec<usize>,
    single_posts: usize,
    creates: Vec<String>,
    offline: bool,
}

/// Behaves like the collector: logs that name an unknown notebook are
/// rejected with `missing_parent`, duplicate notebooks with 409.
#[derive(Debug, Default)]
pub struct FakeCollector {
    inner: Mutex<Inner>,
}

impl FakeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notebooks<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let collector = Self::new();
        collector
            .inner
            .lock()
            .notebooks
            .extend(ids.into_iter().map(str::to_string));
        collector
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    pub fn accepted(&self) -> Vec<LogRecord> {
        self.inner.lock().accepted.clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.inner.lock().batch_sizes.clone()
    }

    pub fn single_posts(&self) -> usize {
        self.inner.lock().single_posts
    }

    pub fn creates(&self) -> Vec<String> {
        self.inner.lock().creates.clone()
    }

    fn parent_known(inner: &Inner, record: &LogRecord) -> bool {
        record
            .info
            .notebook_id()
            .is_none_or(|id| inner.notebooks.contains(id))
    }
}

fn offline_error() -> TrackerError {
    TrackerError::transport("connection refused")
}

fn missing_parent() -> TrackerError {
    TrackerError::rejected(
        Some(404),
        Some(CollectorErrorCode::MissingParent),
        "Notebook not found",
    )
}

#[async_trait]
impl RemoteLogService for FakeCollector {
    async fn post_log(&self, record: &LogRecord) -> TrackerResult<()> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(offline_error());
        }
        inner.single_posts += 1;
        if !Self::parent_known(&inner, record) {
            return Err(missing_parent());
        }
        inner.accepted.push(record.clone());
        Ok(())
    }

    async fn post_batch(&self, items: &[LogRecord]) -> TrackerResult<BatchSummary> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(offline_error());
        }
        inner.batch_sizes.push(items.len());

        let mut results = Vec::with_capacity(items.len());
        for (index, record) in items.iter().enumerate() {
            if Self::parent_known(&inner, record) {
                inner.accepted.push(record.clone());
                results.push(ItemResult::ok(index));
            } else {
                results.push(ItemResult::failed(
                    index,
                    Some(CollectorErrorCode::MissingParent),
                    "Notebook not found",
                ));
            }
        }
        let successful_items = results.iter().filter(|r| r.success).count();
        Ok(BatchSummary {
            total_items: items.len(),
            successful_items,
            failed_items: items.len() - successful_items,
            results,
        })
    }

    async fn create_notebook(&self, notebook: &NotebookInfo) -> TrackerResult<()> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(offline_error());
        }
        inner.creates.push(notebook.notebook_id.clone());
        if !inner.notebooks.insert(notebook.notebook_id.clone()) {
            return Err(TrackerError::rejected(
                Some(409),
                Some(CollectorErrorCode::AlreadyExists),
                "Notebook already exists",
            ));
        }
        Ok(())
    }

    async fn fetch_logs(&self, net_id: &str, course_id: &str) -> TrackerResult<Vec<LogRecord>> {
        Ok(self
            .inner
            .lock()
            .accepted
            .iter()
            .filter(|record| record.subject_id == net_id && record.course_id == course_id)
            .cloned()
            .collect())
    }
}
