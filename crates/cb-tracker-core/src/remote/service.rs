//! Collector interface used by delivery, recovery and the dashboard read path

use super::wire::BatchSummary;
use crate::error::TrackerResult;
use crate::model::{LogRecord, NotebookInfo};
use async_trait::async_trait;

/// Remote log collector
///
/// Implementations map collector replies onto [`crate::error::TrackerError`]:
/// transport problems become `Transport`, `success: false` or non-2xx replies
/// become `Rejected` with the HTTP status and any `error_code` the collector sent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteLogService: Send + Sync {
    /// `POST /logs` with a single record
    async fn post_log(&self, record: &LogRecord) -> TrackerResult<()>;

    /// `POST /logs/batch`; per-item outcomes are in the summary
    async fn post_batch(&self, items: &[LogRecord]) -> TrackerResult<BatchSummary>;

    /// `POST /notebooks`; a 409 surfaces as a conflict error for the caller to absorb
    async fn create_notebook(&self, notebook: &NotebookInfo) -> TrackerResult<()>;

    /// `GET /logs?net_id&course_id`
    async fn fetch_logs(&self, net_id: &str, course_id: &str) -> TrackerResult<Vec<LogRecord>>;
}
