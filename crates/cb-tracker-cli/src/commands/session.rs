//! Recorded sessions: loading, replay and a local stand-in collector

use crate::console::CliConsole;
use anyhow::{Context, bail};
use async_trait::async_trait;
use cb_tracker_core::model::{LogRecord, NotebookInfo};
use cb_tracker_core::remote::BatchSummary;
use cb_tracker_core::tracking::Notifier;
use cb_tracker_core::{
    Clock, HttpLogService, LogManager, ManualClock, RemoteLogService, TimedEvent, Tracker,
    TrackerConfig, TrackerEvent, TrackerResult,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Collector that accepts everything and keeps it in memory
#[derive(Debug, Default)]
pub struct OfflineCollector {
    logs: Mutex<Vec<LogRecord>>,
    notebooks: Mutex<Vec<NotebookInfo>>,
}

impl OfflineCollector {
    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.lock().clone()
    }
}

#[async_trait]
impl RemoteLogService for OfflineCollector {
    async fn post_log(&self, record: &LogRecord) -> TrackerResult<()> {
        self.logs.lock().push(record.clone());
        Ok(())
    }

    async fn post_batch(&self, items: &[LogRecord]) -> TrackerResult<BatchSummary> {
        self.logs.lock().extend_from_slice(items);
        Ok(BatchSummary::all_ok(items.len()))
    }

    async fn create_notebook(&self, notebook: &NotebookInfo) -> TrackerResult<()> {
        self.notebooks.lock().push(notebook.clone());
        Ok(())
    }

    async fn fetch_logs(&self, net_id: &str, course_id: &str) -> TrackerResult<Vec<LogRecord>> {
        Ok(self
            .logs
            .lock()
            .iter()
            .filter(|r| r.subject_id == net_id && r.course_id == course_id)
            .cloned()
            .collect())
    }
}

/// Prints the clipboard notice to the terminal
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        CliConsole::new(true).warn(message);
    }
}

/// Load a JSON Lines recording; blank lines and `#` comments are skipped
pub fn read_events(path: &Path) -> anyhow::Result<Vec<TimedEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read recording {}", path.display()))?;
    parse_events(&content)
}

pub fn parse_events(content: &str) -> anyhow::Result<Vec<TimedEvent>> {
    let mut events: Vec<TimedEvent> = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: TimedEvent = serde_json::from_str(line)
            .with_context(|| format!("line {}: not a recorded event", index + 1))?;
        if let Some(previous) = events.last() {
            if event.at_ms < previous.at_ms {
                bail!(
                    "line {}: events must be in time order ({} < {})",
                    index + 1,
                    event.at_ms,
                    previous.at_ms
                );
            }
        }
        events.push(event);
    }
    Ok(events)
}

/// A tracker running on recorded time
pub struct ReplaySession {
    pub clock: Arc<ManualClock>,
    pub tracker: Arc<Tracker>,
    poll_interval: Duration,
}

impl ReplaySession {
    /// Session whose clock starts at `start_ms`, delivering to `service`
    pub fn new(config: &TrackerConfig, service: Arc<dyn RemoteLogService>, start_ms: i64) -> Self {
        let clock = Arc::new(ManualClock::new(start_ms));
        let as_clock: Arc<dyn Clock> = clock.clone();
        let delivery = LogManager::new(service, as_clock.clone(), config.delivery.clone());
        let tracker = Tracker::new(config, delivery, as_clock).with_notifier(Arc::new(ConsoleNotifier));
        Self {
            clock,
            tracker: Arc::new(tracker),
            poll_interval: config.activity.poll_interval,
        }
    }

    /// Session delivering to the configured collector, or offline
    pub fn for_config(
        config: &TrackerConfig,
        start_ms: i64,
        offline: Option<Arc<OfflineCollector>>,
    ) -> anyhow::Result<Self> {
        let service: Arc<dyn RemoteLogService> = match offline {
            Some(collector) => collector,
            None => {
                config.validate()?;
                Arc::new(HttpLogService::new(&config.server_url, config.request_timeout)?)
            }
        };
        Ok(Self::new(config, service, start_ms))
    }

    /// Feed the events in order, running the idle poll on its interval in between
    ///
    /// The session is always torn down at the end, so everything measured is
    /// submitted before this returns.
    pub async fn play(&self, events: Vec<TimedEvent>) -> usize {
        let poll_ms = i64::try_from(self.poll_interval.as_millis())
            .unwrap_or(i64::MAX)
            .max(1);
        let mut next_poll = self.clock.now_ms().saturating_add(poll_ms);
        let mut handled = 0;

        for timed in events {
            while next_poll <= timed.at_ms {
                self.clock.set(next_poll);
                self.tracker.check_idle().await;
                next_poll = next_poll.saturating_add(poll_ms);
            }
            self.clock.set(timed.at_ms);

            let teardown = matches!(timed.event, TrackerEvent::Teardown);
            self.tracker.handle(timed.event).await;
            handled += 1;
            if teardown {
                break;
            }
        }

        if !self.tracker.is_torn_down() {
            debug!("recording ended without teardown");
            self.tracker.handle(TrackerEvent::Teardown).await;
        }
        handled
    }
}

/// Replay a recording file and return the finished session
pub async fn replay_file(
    config: &TrackerConfig,
    path: &Path,
    offline: Option<Arc<OfflineCollector>>,
) -> anyhow::Result<(ReplaySession, usize)> {
    let events = read_events(path)?;
    let start_ms = events.first().map(|e| e.at_ms).unwrap_or(0);
    let session = ReplaySession::for_config(config, start_ms, offline)?;
    let handled = session.play(events).await;
    Ok((session, handled))
}
