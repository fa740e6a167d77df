//! Missing-parent recovery
//!
//! A notebook-scoped log the collector rejects because its notebook is unknown
//! gets exactly one attempt at repair: create the notebook (an existing one is
//! fine), then resubmit once. A collector rejection after that is logged and
//! dropped; a transport failure hands the record back for batch delivery.

use super::stats::DeliveryStats;
use crate::clock::Clock;
use crate::error::{TrackerError, TrackerResult};
use crate::model::{LogRecord, NotebookInfo};
use crate::remote::{BatchSummary, RemoteLogService};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// Create a notebook, treating "already exists" as success
pub async fn ensure_notebook(
    service: &dyn RemoteLogService,
    notebook: &NotebookInfo,
) -> TrackerResult<()> {
    match service.create_notebook(notebook).await {
        Ok(()) => {
            info!(notebook_id = %notebook.notebook_id, "notebook created");
            Ok(())
        }
        Err(err) if err.is_conflict() => {
            debug!(notebook_id = %notebook.notebook_id, "notebook already exists");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// One recovery pass
///
/// Notebook creation is deduplicated within the pass, so a batch with many
/// orphaned logs for the same notebook issues a single create.
pub struct ParentRecovery<'a> {
    service: &'a dyn RemoteLogService,
    clock: &'a dyn Clock,
    stats: &'a DeliveryStats,
    legacy_error_matching: bool,
    ensured: HashSet<String>,
    /// First creation error per notebook, replayed for later logs in the pass
    failed: HashMap<String, TrackerError>,
}

impl<'a> ParentRecovery<'a> {
    pub fn new(
        service: &'a dyn RemoteLogService,
        clock: &'a dyn Clock,
        stats: &'a DeliveryStats,
        legacy_error_matching: bool,
    ) -> Self {
        Self {
            service,
            clock,
            stats,
            legacy_error_matching,
            ensured: HashSet::new(),
            failed: HashMap::new(),
        }
    }

    /// Make sure the parent of `record` exists, at most one create per notebook per pass
    async fn ensure_parent(&mut self, record: &LogRecord) -> TrackerResult<()> {
        let notebook = NotebookInfo::from_log(record, self.clock.now_utc()).ok_or_else(|| {
            TrackerError::invalid_input(format!(
                "{} log has no parent notebook to recover",
                record.info.kind()
            ))
        })?;

        if self.ensured.contains(&notebook.notebook_id) {
            return Ok(());
        }
        if let Some(err) = self.failed.get(&notebook.notebook_id) {
            return Err(err.clone());
        }

        match ensure_notebook(self.service, &notebook).await {
            Ok(()) => {
                self.stats.parents_created.inc();
                self.ensured.insert(notebook.notebook_id);
                Ok(())
            }
            Err(err) => {
                self.failed.insert(notebook.notebook_id, err.clone());
                Err(err)
            }
        }
    }

    /// Create the parent, then resubmit the record once
    ///
    /// The error of whichever step failed is returned; callers requeue the
    /// record when it is a transport failure.
    pub async fn recover_single(&mut self, record: &LogRecord) -> TrackerResult<()> {
        self.ensure_parent(record).await?;
        self.stats.individual_sent.inc();
        self.service.post_log(record).await?;
        self.stats.delivered.inc();
        info!(kind = record.info.kind(), "log delivered after parent recovery");
        Ok(())
    }

    /// Handle the failed items of a partially accepted batch
    ///
    /// Missing-parent items are repaired and resubmitted one by one; every
    /// other failure is reported and dropped. Items whose repair hit a
    /// transport failure are returned for requeueing.
    pub async fn recover_failed_items(
        &mut self,
        items: &[LogRecord],
        summary: &BatchSummary,
    ) -> Vec<LogRecord> {
        let mut retry = Vec::new();
        for failure in summary.failures() {
            let Some(record) = items.get(failure.index) else {
                warn!(index = failure.index, "collector reported a failure for an unknown batch index");
                continue;
            };

            if !failure.is_missing_parent(self.legacy_error_matching) {
                error!(
                    index = failure.index,
                    kind = record.info.kind(),
                    error = failure.error.as_deref().unwrap_or("unknown"),
                    "batch item rejected; dropping"
                );
                self.stats.dropped.inc();
                continue;
            }

            match self.recover_single(record).await {
                Ok(()) => {}
                Err(err) if err.is_transport() => {
                    warn!(index = failure.index, error = %err, "parent recovery interrupted; log kept");
                    retry.push(record.clone());
                }
                Err(err) => {
                    error!(index = failure.index, error = %err, "parent recovery failed; dropping log");
                    self.stats.dropped.inc();
                }
            }
        }
        retry
    }

    /// Whole batch rejected for a missing parent: create every distinct parent, re-post once
    ///
    /// A transport failure while creating parents aborts before the re-post so
    /// the caller can requeue the batch intact.
    pub async fn recover_whole_batch(&mut self, items: &[LogRecord]) -> TrackerResult<BatchSummary> {
        for record in items {
            if record.info.notebook_id().is_none() {
                continue;
            }
            match self.ensure_parent(record).await {
                Ok(()) => {}
                Err(err) if err.is_transport() => return Err(err),
                Err(err) => warn!(error = %err, "could not create parent notebook for batch"),
            }
        }

        self.stats.batches_sent.inc();
        let summary = self.service.post_batch(items).await?;
        info!(
            batch_size = items.len(),
            accepted = summary.successful_items,
            "batch re-posted after parent recovery"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CollectorErrorCode;
    use crate::model::{LogInfo, UploadMode};
    use crate::remote::{ItemResult, MockRemoteLogService};

    fn cell_log(notebook: &str, cell: &str) -> LogRecord {
        LogRecord::new(
            "jd123",
            "CS101",
            LogInfo::Cell {
                notebook_id: notebook.to_string(),
                cell_id: cell.to_string(),
                duration: 4,
            },
            UploadMode::Batched,
        )
    }

    fn missing_parent() -> TrackerError {
        TrackerError::rejected(Some(404), None, "Notebook not found")
    }

    #[tokio::test]
    async fn test_conflict_counts_as_created() {
        let mut service = MockRemoteLogService::new();
        service
            .expect_create_notebook()
            .times(1)
            .returning(|_| Err(TrackerError::rejected(Some(409), None, "exists")));

        let notebook = NotebookInfo::from_log(&cell_log("nb", "c"), chrono::Utc::now()).unwrap();
        assert!(ensure_notebook(&service, &notebook).await.is_ok());
    }

    #[tokio::test]
    async fn test_single_recovery_retries_exactly_once() {
        let mut service = MockRemoteLogService::new();
        service.expect_create_notebook().times(1).returning(|_| Ok(()));
        service.expect_post_log().times(1).returning(|_| Err(missing_parent()));

        let clock = ManualClock::new(0);
        let stats = DeliveryStats::default();
        let mut recovery = ParentRecovery::new(&service, &clock, &stats, false);

        let err = recovery.recover_single(&cell_log("nb", "c")).await.unwrap_err();
        assert!(err.is_missing_parent());
        assert_eq!(stats.parents_created.get(), 1);
    }

    #[tokio::test]
    async fn test_window_log_cannot_be_recovered() {
        let service = MockRemoteLogService::new();
        let clock = ManualClock::new(0);
        let stats = DeliveryStats::default();
        let mut recovery = ParentRecovery::new(&service, &clock, &stats, false);

        let window = LogRecord::new("u", "c", LogInfo::Window { duration: 3 }, UploadMode::Immediate);
        let err = recovery.recover_single(&window).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_failed_items_dedup_notebook_creation() {
        let items = vec![
            cell_log("nb-a", "1"),
            cell_log("nb-a", "2"),
            cell_log("nb-b", "3"),
        ];
        let summary = BatchSummary {
            total_items: 3,
            successful_items: 0,
            failed_items: 3,
            results: vec![
                ItemResult::failed(0, Some(CollectorErrorCode::MissingParent), "missing"),
                ItemResult::failed(1, Some(CollectorErrorCode::MissingParent), "missing"),
                ItemResult::failed(2, Some(CollectorErrorCode::Other("validation".into())), "bad"),
            ],
        };

        let mut service = MockRemoteLogService::new();
        service
            .expect_create_notebook()
            .withf(|notebook| notebook.notebook_id == "nb-a")
            .times(1)
            .returning(|_| Ok(()));
        service
            .expect_post_log()
            .withf(|record| record.info.notebook_id() == Some("nb-a"))
            .times(2)
            .returning(|_| Ok(()));

        let clock = ManualClock::new(0);
        let stats = DeliveryStats::default();
        let mut recovery = ParentRecovery::new(&service, &clock, &stats, false);
        recovery.recover_failed_items(&items, &summary).await;

        assert_eq!(stats.delivered.get(), 2);
        assert_eq!(stats.dropped.get(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_on_create_is_replayed_within_pass() {
        let items = vec![cell_log("nb-a", "1"), cell_log("nb-a", "2"), cell_log("nb-b", "3")];
        let summary = BatchSummary {
            total_items: 3,
            successful_items: 0,
            failed_items: 3,
            results: (0..3)
                .map(|i| ItemResult::failed(i, Some(CollectorErrorCode::MissingParent), "missing"))
                .collect(),
        };

        let mut service = MockRemoteLogService::new();
        service
            .expect_create_notebook()
            .withf(|notebook| notebook.notebook_id == "nb-a")
            .times(1)
            .returning(|_| Err(TrackerError::transport("connection reset")));
        service
            .expect_create_notebook()
            .withf(|notebook| notebook.notebook_id == "nb-b")
            .times(1)
            .returning(|_| Ok(()));
        service
            .expect_post_log()
            .withf(|record| record.info.notebook_id() == Some("nb-b"))
            .times(1)
            .returning(|_| Ok(()));

        let clock = ManualClock::new(0);
        let stats = DeliveryStats::default();
        let mut recovery = ParentRecovery::new(&service, &clock, &stats, false);
        let retry = recovery.recover_failed_items(&items, &summary).await;

        assert_eq!(retry, vec![items[0].clone(), items[1].clone()]);
        assert_eq!(stats.delivered.get(), 1);
        assert_eq!(stats.dropped.get(), 0);
    }

    #[tokio::test]
    async fn test_whole_batch_stops_before_repost_when_offline() {
        let items = vec![cell_log("nb-a", "1"), cell_log("nb-b", "2")];

        let mut service = MockRemoteLogService::new();
        service
            .expect_create_notebook()
            .times(1)
            .returning(|_| Err(TrackerError::transport("timed out")));
        service.expect_post_batch().times(0);

        let clock = ManualClock::new(0);
        let stats = DeliveryStats::default();
        let mut recovery = ParentRecovery::new(&service, &clock, &stats, false);
        let err = recovery.recover_whole_batch(&items).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_whole_batch_creates_each_parent_then_reposts() {
        let items = vec![cell_log("nb-a", "1"), cell_log("nb-b", "2"), cell_log("nb-a", "3")];

        let mut service = MockRemoteLogService::new();
        service.expect_create_notebook().times(2).returning(|_| Ok(()));
        service
            .expect_post_batch()
            .withf(|items| items.len() == 3)
            .times(1)
            .returning(|items| Ok(BatchSummary::all_ok(items.len())));

        let clock = ManualClock::new(0);
        let stats = DeliveryStats::default();
        let mut recovery = ParentRecovery::new(&service, &clock, &stats, false);
        let summary = recovery.recover_whole_batch(&items).await.unwrap();

        assert_eq!(summary.successful_items, 3);
        assert_eq!(stats.parents_created.get(), 2);
    }
}
