//! Event-driven orchestration of the trackers
//!
//! All session bookkeeping happens synchronously under one lock, which is
//! released before any upload is awaited. An event that arrives while an
//! earlier upload is still in flight therefore always sees closed sessions.

use super::activity::{ActivityClock, Attention, AttentionChange};
use super::cell_session::CellSessionTracker;
use super::copy_paste::{self, CopyPasteMonitor, Notifier, RECORDING_NOTICE, TracingNotifier};
use super::events::{DocumentRef, TrackerEvent, Visibility};
use super::page_session::PageSessionTracker;
use super::stats::{EngagementStats, StatsPublisher};
use super::window_focus::WindowFocusTracker;
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::delivery::LogManager;
use crate::delivery::recovery::ensure_notebook;
use crate::error::TrackerResult;
use crate::export::{ContentSink, CopyPasteSummary, Exporter, JupyterContentsSink};
use crate::model::{
    CellVisitRecord, ClipboardContext, CopyPasteRecord, Identity, LogInfo, LogRecord,
    NotebookInfo, PageVisitRecord, UploadMode,
};
use crate::remote::{HttpLogService, RemoteLogService};
use crate::store::{LogStore, StoreSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Work decided under the state lock and carried out after it is released
#[derive(Debug, Default)]
struct Effects {
    registrations: Vec<NotebookInfo>,
    submissions: Vec<LogRecord>,
    notice: bool,
    autosave: bool,
    flush: bool,
}

#[derive(Debug)]
struct TrackerState {
    identity: Identity,
    activity: ActivityClock,
    window: WindowFocusTracker,
    pages: PageSessionTracker,
    cells: CellSessionTracker,
    clipboard: CopyPasteMonitor,
    store: LogStore,
    /// The host's current document, known even while no session is open
    current_document: Option<String>,
}

impl TrackerState {
    fn new(config: &TrackerConfig, now_ms: i64) -> Self {
        Self {
            identity: Identity::new(&config.net_id, &config.course_id),
            activity: ActivityClock::new(now_ms, config.activity.idle_threshold),
            window: WindowFocusTracker::new(now_ms, true),
            pages: PageSessionTracker::new(),
            cells: CellSessionTracker::new(),
            clipboard: CopyPasteMonitor::new(&config.content),
            store: LogStore::init(),
            current_document: None,
        }
    }

    fn apply(&mut self, event: TrackerEvent, now_ms: i64, fx: &mut Effects) {
        match event {
            TrackerEvent::Activity { .. } => self.mark_activity(now_ms),
            TrackerEvent::Focus => self.focus(now_ms),
            TrackerEvent::Blur => self.blur(now_ms, fx),
            TrackerEvent::VisibilityChanged { visibility } => match visibility {
                Visibility::Hidden => {
                    self.blur(now_ms, fx);
                    fx.flush = true;
                }
                Visibility::Visible => self.focus(now_ms),
            },
            TrackerEvent::CurrentChanged { document } => {
                let page_id = document.as_ref().map(DocumentRef::page_id);
                self.current_document = page_id.clone();
                if let Some(visit) = self.pages.switch_to(page_id.clone(), now_ms) {
                    self.close_out(visit, fx);
                }
                if let Some(page_id) = page_id {
                    debug!(page_id = %page_id, "page session started");
                }
                self.mark_activity(now_ms);
            }
            TrackerEvent::NotebookOpened { document } => match document.path.as_deref() {
                Some(path) if !path.is_empty() => fx.registrations.push(NotebookInfo::for_opened(
                    path,
                    &self.identity,
                    document.activebook,
                    utc(now_ms),
                )),
                _ => debug!("opened document has no path; not registered"),
            },
            TrackerEvent::ActiveCellChanged { notebook_id, cell } => {
                if let Some(visit) = self.cells.switch(&notebook_id, cell, now_ms) {
                    debug!(
                        notebook_id = %visit.notebook_id,
                        cell_id = %visit.cell_id,
                        duration = visit.active_duration_seconds,
                        "cell session closed"
                    );
                    self.store.push_cell_visit(visit);
                }
            }
            TrackerEvent::DocumentDisposed { notebook_id } => {
                if let Some(visit) = self.cells.close(&notebook_id, now_ms) {
                    self.store.push_cell_visit(visit);
                }
            }
            TrackerEvent::Copy { selection } => {
                fx.notice |= self.clipboard.notice_due(now_ms);
                let context = self.clipboard_context();
                let record = self.clipboard.on_copy(&selection, context, now_ms);
                self.capture(record, fx);
            }
            TrackerEvent::Paste { clipboard } => {
                fx.notice |= self.clipboard.notice_due(now_ms);
                let context = self.clipboard_context();
                let record = self.clipboard.on_paste(&clipboard, context, now_ms);
                self.capture(record, fx);
            }
            TrackerEvent::Teardown => self.teardown(now_ms, fx),
        }
    }

    fn mark_activity(&mut self, now_ms: i64) {
        if let Some(AttentionChange::Resumed) = self.activity.mark_activity(now_ms) {
            info!("activity detected; tracking resumed");
            self.window.resume(now_ms);
        }
        self.pages.touch(now_ms);
    }

    fn focus(&mut self, now_ms: i64) {
        self.window.on_focus(now_ms, self.activity.is_paused());
        self.mark_activity(now_ms);
    }

    fn blur(&mut self, now_ms: i64, fx: &mut Effects) {
        if let Some(duration) = self.window.on_blur(now_ms, self.activity.is_paused()) {
            debug!(duration, "window focus lost");
            fx.submissions.push(
                self.identity
                    .record(LogInfo::Window { duration }, UploadMode::Immediate),
            );
        }
    }

    /// Idle poll tick
    fn check_idle(&mut self, now_ms: i64, fx: &mut Effects) {
        if let Some(AttentionChange::Paused { last_activity_ms }) = self.activity.poll(now_ms) {
            info!(
                idle_secs = (now_ms - last_activity_ms) / 1000,
                "tracking paused due to inactivity"
            );
            self.window.suspend();
            if let Some(visit) = self.pages.close() {
                self.close_out(visit, fx);
            }
        }
    }

    /// Record a closed page and queue its uploads
    ///
    /// The notebook log goes out immediately; the page's cell logs are batched.
    fn close_out(&mut self, visit: PageVisitRecord, fx: &mut Effects) {
        info!(
            page_id = %visit.page_id,
            duration = visit.active_duration_seconds,
            "page session closed"
        );
        if visit.active_duration_seconds > 0 {
            fx.submissions.push(self.identity.record(
                LogInfo::Notebook {
                    notebook_id: visit.page_id.clone(),
                    duration: visit.active_duration_seconds,
                },
                UploadMode::Immediate,
            ));
        }

        let cells = self.store.drain_cells_for(&visit.page_id);
        if !cells.is_empty() {
            debug!(page_id = %visit.page_id, cells = cells.len(), "queueing cell logs");
        }
        self.queue_cells(cells, fx);
        self.store.push_page_visit(visit);
    }

    fn queue_cells(&self, cells: Vec<CellVisitRecord>, fx: &mut Effects) {
        fx.submissions.extend(
            cells
                .into_iter()
                .filter(|cell| cell.active_duration_seconds > 0)
                .map(|cell| {
                    self.identity.record(
                        LogInfo::Cell {
                            notebook_id: cell.notebook_id,
                            cell_id: cell.cell_id,
                            duration: cell.active_duration_seconds,
                        },
                        UploadMode::Batched,
                    )
                }),
        );
    }

    fn clipboard_context(&self) -> ClipboardContext {
        let notebook_id = self
            .current_document
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let cell_id = self.cells.active_cell(&notebook_id).map(str::to_string);
        ClipboardContext {
            notebook_id,
            cell_id,
        }
    }

    fn capture(&mut self, record: Option<CopyPasteRecord>, fx: &mut Effects) {
        let Some(record) = record else {
            return;
        };
        debug!(
            action = ?record.action,
            length = record.content_length,
            source = ?record.source_type,
            notebook_id = %record.context.notebook_id,
            "clipboard activity captured"
        );
        fx.submissions.push(
            self.identity
                .record(copy_paste::log_info(&record), UploadMode::Immediate),
        );
        self.store.push_copy_paste(record);
        fx.autosave = true;
    }

    fn teardown(&mut self, now_ms: i64, fx: &mut Effects) {
        for visit in self.cells.close_all(now_ms) {
            self.store.push_cell_visit(visit);
        }
        if let Some(visit) = self.pages.close() {
            self.close_out(visit, fx);
        }
        let remaining = self.store.take_cell_visits();
        self.queue_cells(remaining, fx);

        fx.flush = true;
        self.store.dispose();
        info!("tracker torn down");
    }

    fn stats(&self, now_ms: i64) -> EngagementStats {
        EngagementStats {
            focus_loss_count: self.window.focus_loss_count(),
            window_active_ms: self.window.active_ms(Some(now_ms)),
            copy_paste_count: self.store.copy_paste().len(),
            page_visit_count: self.store.page_visits().len(),
            attention: self.activity.attention(),
        }
    }
}

fn utc(now_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_ms).unwrap_or_else(Utc::now)
}

/// Engagement tracker for one host session
pub struct Tracker {
    session_id: Uuid,
    clock: Arc<dyn Clock>,
    delivery: Arc<LogManager>,
    notifier: Arc<dyn Notifier>,
    autosave: Option<Exporter>,
    poll_interval: Duration,
    state: Mutex<TrackerState>,
    stats: StatsPublisher,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("session_id", &self.session_id)
            .field("delivery", &self.delivery)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(config: &TrackerConfig, delivery: Arc<LogManager>, clock: Arc<dyn Clock>) -> Self {
        let now_ms = clock.now_ms();
        let session_id = Uuid::new_v4();
        info!(
            session_id = %session_id,
            net_id = %config.net_id,
            course_id = %config.course_id,
            "tracking started"
        );
        Self {
            session_id,
            state: Mutex::new(TrackerState::new(config, now_ms)),
            clock,
            delivery,
            notifier: Arc::new(TracingNotifier),
            autosave: None,
            poll_interval: config.activity.poll_interval,
            stats: StatsPublisher::new(),
        }
    }

    /// Tracker wired to the HTTP collector named in `config`
    ///
    /// When a contents API is configured, clipboard logs are also saved there
    /// after every capture.
    pub fn connect(config: &TrackerConfig, clock: Arc<dyn Clock>) -> TrackerResult<Self> {
        config.validate()?;
        let service: Arc<dyn RemoteLogService> =
            Arc::new(HttpLogService::new(&config.server_url, config.request_timeout)?);
        let delivery = LogManager::new(service, clock.clone(), config.delivery.clone());

        let mut tracker = Self::new(config, delivery, clock);
        if let Some(url) = &config.contents_url {
            let sink =
                JupyterContentsSink::new(url, config.contents_token.clone(), config.request_timeout)?;
            tracker = tracker.with_autosave(Arc::new(sink));
        }
        Ok(tracker)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Save `copy-paste-logs.json` to `sink` after every clipboard capture
    pub fn with_autosave(mut self, sink: Arc<dyn ContentSink>) -> Self {
        self.autosave = Some(Exporter::new(sink));
        self
    }

    /// Identifies this tracker's spans in the logs
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn delivery(&self) -> &Arc<LogManager> {
        &self.delivery
    }

    /// React to one host event
    #[instrument(skip_all, fields(session = %self.session_id, event = event.name()))]
    pub async fn handle(&self, event: TrackerEvent) {
        let now_ms = self.clock.now_ms();
        let name = event.name();
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock();
            if state.store.is_disposed() {
                debug!(event = name, "event after teardown ignored");
                return;
            }
            state.apply(event, now_ms, &mut fx);
            self.stats.publish(state.stats(now_ms));
        }
        self.perform(fx).await;
    }

    /// One idle poll; pauses tracking once the user has been idle too long
    pub async fn check_idle(&self) {
        let now_ms = self.clock.now_ms();
        let mut fx = Effects::default();
        {
            let mut state = self.state.lock();
            if state.store.is_disposed() {
                return;
            }
            state.check_idle(now_ms, &mut fx);
            self.stats.publish(state.stats(now_ms));
        }
        self.perform(fx).await;
    }

    async fn perform(&self, fx: Effects) {
        if fx.notice {
            self.notifier.notify(RECORDING_NOTICE);
        }

        for notebook in fx.registrations {
            if let Err(err) = ensure_notebook(self.delivery.service().as_ref(), &notebook).await {
                warn!(notebook_id = %notebook.notebook_id, error = %err, "notebook registration failed");
            }
        }

        for record in fx.submissions {
            self.delivery.submit(record).await;
        }

        if fx.autosave {
            if let Some(exporter) = &self.autosave {
                let snapshot = self.snapshot();
                if let Err(err) = exporter.save_copy_paste(&snapshot, self.clock.now_ms()).await {
                    warn!(error = %err, "copy/paste autosave failed");
                }
            }
        }

        if fx.flush {
            self.delivery.flush(true).await;
        }
    }

    /// Run [`Tracker::check_idle`] on the configured poll interval until cancelled
    pub fn spawn_idle_monitor(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tracker.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => tracker.check_idle().await,
                    _ = cancel.cancelled() => {
                        debug!("idle monitor shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Drive the tracker from a channel of host events
    ///
    /// Returns after teardown, which happens on a `Teardown` event, when the
    /// channel closes, or when `cancel` fires.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<TrackerEvent>, cancel: CancellationToken) {
        let monitor_cancel = cancel.child_token();
        let monitor = self.spawn_idle_monitor(monitor_cancel.clone());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(TrackerEvent::Teardown) | None => break,
                    Some(event) => self.handle(event).await,
                },
            }
        }

        monitor_cancel.cancel();
        if let Err(err) = monitor.await {
            warn!(error = %err, "idle monitor task failed");
        }
        self.handle(TrackerEvent::Teardown).await;
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<EngagementStats> {
        self.stats.subscribe()
    }

    pub fn stats(&self) -> EngagementStats {
        self.stats.current()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().store.snapshot()
    }

    pub fn copy_paste_summary(&self) -> CopyPasteSummary {
        CopyPasteSummary::from_records(self.state.lock().store.copy_paste())
    }

    pub fn attention(&self) -> Attention {
        self.state.lock().activity.attention()
    }

    pub fn current_page(&self) -> Option<String> {
        self.state.lock().pages.current_page().map(str::to_string)
    }

    /// Seconds so far on the active cell of `notebook_id`
    pub fn open_cell_seconds(&self, notebook_id: &str) -> u64 {
        let now_ms = self.clock.now_ms();
        self.state.lock().cells.open_seconds(notebook_id, now_ms)
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.lock().store.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::remote::{BatchSummary, MockRemoteLogService};
    use crate::tracking::copy_paste::MockNotifier;
    use crate::tracking::events::{ActivitySignal, CellRef};

    struct Harness {
        clock: Arc<ManualClock>,
        tracker: Arc<Tracker>,
        posted: Arc<Mutex<Vec<LogRecord>>>,
        batched: Arc<Mutex<Vec<LogRecord>>>,
    }

    fn harness(notifier: Option<MockNotifier>) -> Harness {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let batched = Arc::new(Mutex::new(Vec::new()));

        let mut service = MockRemoteLogService::new();
        let sink = posted.clone();
        service.expect_post_log().returning(move |record| {
            sink.lock().push(record.clone());
            Ok(())
        });
        let sink = batched.clone();
        service.expect_post_batch().returning(move |items| {
            sink.lock().extend(items.iter().cloned());
            Ok(BatchSummary::all_ok(items.len()))
        });
        service.expect_create_notebook().returning(|_| Ok(()));

        let config = TrackerConfig {
            net_id: "jd123".to_string(),
            course_id: "CS101".to_string(),
            ..TrackerConfig::default()
        };
        let clock = Arc::new(ManualClock::new(0));
        let delivery = LogManager::new(Arc::new(service), clock.clone(), config.delivery.clone());
        let mut tracker = Tracker::new(&config, delivery, clock.clone());
        if let Some(notifier) = notifier {
            tracker = tracker.with_notifier(Arc::new(notifier));
        }

        Harness {
            clock,
            tracker: Arc::new(tracker),
            posted,
            batched,
        }
    }

    fn open(path: &str) -> TrackerEvent {
        TrackerEvent::CurrentChanged {
            document: Some(DocumentRef::notebook(path)),
        }
    }

    fn activity() -> TrackerEvent {
        TrackerEvent::Activity {
            signal: ActivitySignal::KeyDown,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_pause_closes_page_at_last_activity() {
        let h = harness(None);
        h.tracker.handle(open("A.ipynb")).await;

        h.clock.set(65_000);
        h.tracker.handle(activity()).await;

        for tick in (70..=190).step_by(10) {
            h.clock.set(tick * 1000);
            h.tracker.check_idle().await;
            if tick < 190 {
                assert_eq!(h.tracker.attention(), Attention::Active, "paused early at {}s", tick);
            }
        }

        assert_eq!(h.tracker.attention(), Attention::Paused);
        let snapshot = h.tracker.snapshot();
        assert_eq!(snapshot.page_visits.len(), 1);
        assert_eq!(snapshot.page_visits[0].page_id, "A.ipynb");
        assert_eq!(snapshot.page_visits[0].active_duration_seconds, 65);
        assert!(h.tracker.current_page().is_none());

        let posted = h.posted.lock();
        assert_eq!(posted.len(), 1);
        assert_eq!(
            posted[0].info,
            LogInfo::Notebook {
                notebook_id: "A.ipynb".to_string(),
                duration: 65
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_does_not_reopen_page() {
        let h = harness(None);
        h.tracker.handle(open("A.ipynb")).await;
        h.clock.set(200_000);
        h.tracker.check_idle().await;
        assert_eq!(h.tracker.attention(), Attention::Paused);

        h.clock.set(210_000);
        h.tracker.handle(activity()).await;
        assert_eq!(h.tracker.attention(), Attention::Active);
        assert!(h.tracker.current_page().is_none());

        h.tracker.handle(open("B.ipynb")).await;
        assert_eq!(h.tracker.current_page().as_deref(), Some("B.ipynb"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_flushes_page_cells_as_batch() {
        let h = harness(None);
        h.tracker.handle(open("A.ipynb")).await;
        h.tracker
            .handle(TrackerEvent::ActiveCellChanged {
                notebook_id: "A.ipynb".into(),
                cell: Some(CellRef::new("c1", 0)),
            })
            .await;

        h.clock.set(20_000);
        h.tracker
            .handle(TrackerEvent::ActiveCellChanged {
                notebook_id: "A.ipynb".into(),
                cell: Some(CellRef::new("c2", 1)),
            })
            .await;
        h.clock.set(20_500);
        h.tracker.handle(activity()).await;
        h.tracker
            .handle(TrackerEvent::ActiveCellChanged {
                notebook_id: "A.ipynb".into(),
                cell: Some(CellRef::new("c3", 2)),
            })
            .await;

        h.clock.set(30_000);
        h.tracker.handle(open("B.ipynb")).await;

        // Notebook log went out on its own; the 20s cell waits in the queue,
        // the sub-second cell is dropped
        assert_eq!(h.posted.lock().len(), 1);
        assert_eq!(h.tracker.delivery().pending(), 1);
        assert!(h.tracker.snapshot().cell_visits.is_empty());

        h.tracker.delivery().flush(true).await;
        let batched = h.batched.lock();
        assert_eq!(batched.len(), 1);
        assert!(matches!(
            &batched[0].info,
            LogInfo::Cell { cell_id, duration: 20, .. } if cell_id == "c1"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_posts_window_time_and_counts_switches() {
        let h = harness(None);
        h.clock.set(42_000);
        h.tracker.handle(TrackerEvent::Blur).await;
        h.clock.set(50_000);
        h.tracker.handle(TrackerEvent::Focus).await;
        h.clock.set(53_000);
        h.tracker
            .handle(TrackerEvent::VisibilityChanged {
                visibility: Visibility::Hidden,
            })
            .await;

        let durations: Vec<_> = h
            .posted
            .lock()
            .iter()
            .map(|record| record.info.clone())
            .collect();
        assert_eq!(
            durations,
            vec![LogInfo::Window { duration: 42 }, LogInfo::Window { duration: 3 }]
        );

        let stats = h.tracker.stats();
        assert_eq!(stats.focus_loss_count, 1);
        assert_eq!(stats.window_active_ms, 45_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_paste_context_and_notice() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).return_const(());
        let h = harness(Some(notifier));

        h.tracker.handle(open("CS101/lab.ipynb")).await;
        h.tracker
            .handle(TrackerEvent::ActiveCellChanged {
                notebook_id: "CS101/lab.ipynb".into(),
                cell: Some(CellRef::new("c7", 6)),
            })
            .await;
        h.tracker
            .handle(TrackerEvent::Copy {
                selection: "print(x)".into(),
            })
            .await;
        h.clock.set(1_000);
        h.tracker
            .handle(TrackerEvent::Paste {
                clipboard: "print(x)".into(),
            })
            .await;

        let snapshot = h.tracker.snapshot();
        assert_eq!(snapshot.copy_paste.len(), 2);
        assert_eq!(snapshot.copy_paste[1].context.cell_id.as_deref(), Some("c7"));

        let summary = h.tracker.copy_paste_summary();
        assert_eq!(summary.counts.internal_pastes, 1);
        assert_eq!(h.posted.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_closes_everything_and_flushes() {
        let h = harness(None);
        h.tracker.handle(open("A.ipynb")).await;
        h.tracker
            .handle(TrackerEvent::ActiveCellChanged {
                notebook_id: "A.ipynb".into(),
                cell: Some(CellRef::new("c1", 0)),
            })
            .await;
        h.clock.set(15_000);
        h.tracker.handle(activity()).await;
        h.tracker.handle(TrackerEvent::Teardown).await;

        assert!(h.tracker.is_torn_down());
        assert_eq!(h.tracker.delivery().pending(), 0);
        assert_eq!(h.batched.lock().len(), 1);
        assert_eq!(h.posted.lock().len(), 1);

        // Ignored after teardown
        h.tracker.handle(open("B.ipynb")).await;
        assert!(h.tracker.current_page().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_tears_down_when_channel_closes() {
        let h = harness(None);
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(h.tracker.clone().run(rx, cancel));

        tx.send(open("A.ipynb")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(h.tracker.is_torn_down());
        assert_eq!(h.tracker.snapshot().page_visits.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notebook_registration_on_open() {
        let mut service = MockRemoteLogService::new();
        service
            .expect_create_notebook()
            .withf(|notebook| notebook.course_id == "CS200" && notebook.name == "intro.ipynb")
            .times(1)
            .returning(|_| Err(crate::error::TrackerError::rejected(Some(409), None, "exists")));

        let clock = Arc::new(ManualClock::new(0));
        let config = TrackerConfig::default();
        let delivery = LogManager::new(Arc::new(service), clock.clone(), config.delivery.clone());
        let tracker = Tracker::new(&config, delivery, clock);

        tracker
            .handle(TrackerEvent::NotebookOpened {
                document: DocumentRef {
                    path: Some("CS200/week1/intro.ipynb".into()),
                    activebook: true,
                    ..DocumentRef::default()
                },
            })
            .await;
    }
}
