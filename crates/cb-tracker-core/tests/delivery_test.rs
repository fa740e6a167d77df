//! Delivery against an in-memory collector

mod common;

use cb_tracker_core::clock::ManualClock;
use cb_tracker_core::config::DeliveryConfig;
use cb_tracker_core::delivery::LogManager;
use cb_tracker_core::model::{Identity, LogInfo, LogRecord, UploadMode};
use cb_tracker_core::remote::RemoteLogService;
use common::FakeCollector;
use std::sync::Arc;
use std::time::Duration;

fn identity() -> Identity {
    Identity::new("jd123", "CS101")
}

fn cell(notebook: &str, n: usize) -> LogRecord {
    identity().record(
        LogInfo::Cell {
            notebook_id: notebook.to_string(),
            cell_id: format!("cell-{}", n),
            duration: 5,
        },
        UploadMode::Batched,
    )
}

fn manager(collector: Arc<FakeCollector>) -> Arc<LogManager> {
    LogManager::new(
        collector,
        Arc::new(ManualClock::new(1_700_000_000_000)),
        DeliveryConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn fifty_one_submissions_make_two_batches() {
    let collector = Arc::new(FakeCollector::with_notebooks(["nb"]));
    let manager = manager(collector.clone());

    for n in 0..51 {
        manager.submit(cell("nb", n)).await;
    }
    assert_eq!(collector.batch_sizes(), vec![50]);

    tokio::time::sleep(Duration::from_secs(30)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert_eq!(collector.batch_sizes(), vec![50, 1]);
    assert_eq!(collector.accepted().len(), 51);
    assert_eq!(manager.stats().batches_sent, 2);
}

#[tokio::test(start_paused = true)]
async fn immediate_log_for_unknown_notebook_creates_parent_once() {
    let collector = Arc::new(FakeCollector::new());
    let manager = manager(collector.clone());

    manager
        .submit(identity().record(
            LogInfo::Notebook {
                notebook_id: "CS101/lab1.ipynb".to_string(),
                duration: 65,
            },
            UploadMode::Immediate,
        ))
        .await;

    assert_eq!(collector.creates(), vec!["CS101/lab1.ipynb".to_string()]);
    assert_eq!(collector.single_posts(), 2);
    assert_eq!(collector.accepted().len(), 1);
    assert_eq!(manager.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn partial_batch_recovers_each_orphan_with_one_create_per_notebook() {
    let collector = Arc::new(FakeCollector::with_notebooks(["known"]));
    let manager = manager(collector.clone());

    for (n, notebook) in ["known", "orphan", "orphan", "other"].iter().enumerate() {
        manager.submit(cell(notebook, n)).await;
    }
    manager.flush(true).await;

    assert_eq!(collector.batch_sizes(), vec![4]);
    assert_eq!(collector.creates(), vec!["orphan".to_string(), "other".to_string()]);
    assert_eq!(collector.accepted().len(), 4);

    let stats = manager.stats();
    assert_eq!(stats.delivered, 4);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.parents_created, 2);
}

#[tokio::test(start_paused = true)]
async fn offline_batch_is_kept_until_collector_returns() {
    let collector = Arc::new(FakeCollector::with_notebooks(["nb"]));
    collector.set_offline(true);
    let manager = manager(collector.clone());

    manager
        .submit(identity().record(LogInfo::Window { duration: 12 }, UploadMode::Immediate))
        .await;
    manager.submit(cell("nb", 1)).await;
    manager.flush(true).await;

    assert_eq!(manager.pending(), 2);
    assert!(collector.accepted().is_empty());

    collector.set_offline(false);
    manager.flush(true).await;
    assert_eq!(manager.pending(), 0);

    let fetched = collector.fetch_logs("jd123", "CS101").await.unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].info, LogInfo::Window { duration: 12 });
}
