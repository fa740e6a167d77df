//! Hybrid immediate/batched log manager

use super::recovery::ParentRecovery;
use super::stats::{DeliveryStats, DeliveryStatsSnapshot};
use crate::clock::Clock;
use crate::config::DeliveryConfig;
use crate::model::{LogRecord, UploadMode};
use crate::remote::RemoteLogService;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Default)]
struct BatchState {
    queue: Vec<LogRecord>,
    /// Cancels the armed flush timer; `None` when no timer is pending
    timer: Option<CancellationToken>,
    /// Batch uploads currently awaiting the collector
    in_flight: usize,
    /// Consecutive batch uploads that failed in transport; while non-zero only
    /// the timer retries, with a growing wait
    transport_failures: u32,
}

/// What happened to a batch handed to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchOutcome {
    Settled,
    Requeued,
}

/// Routes records to the collector
///
/// Immediate records are posted on their own; a failure other than a missing
/// parent demotes them to the batch queue. Batched records are flushed when the
/// queue reaches `max_batch_size` or `max_wait` after the first queued record,
/// whichever comes first. At most one batch timer is pending at any time and no
/// batch exceeds `max_batch_size`.
pub struct LogManager {
    service: Arc<dyn RemoteLogService>,
    clock: Arc<dyn Clock>,
    config: DeliveryConfig,
    state: Mutex<BatchState>,
    stats: DeliveryStats,
    me: Weak<LogManager>,
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("config", &self.config)
            .field("pending", &self.pending())
            .finish()
    }
}

impl LogManager {
    pub fn new(
        service: Arc<dyn RemoteLogService>,
        clock: Arc<dyn Clock>,
        config: DeliveryConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            service,
            clock,
            config,
            state: Mutex::new(BatchState::default()),
            stats: DeliveryStats::default(),
            me: me.clone(),
        })
    }

    /// Records waiting in the batch queue
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether a batch timer is currently armed
    pub fn timer_armed(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn service(&self) -> &Arc<dyn RemoteLogService> {
        &self.service
    }

    /// Deliver one record according to its upload mode
    #[instrument(skip(self, record), fields(kind = record.info.kind(), mode = ?record.upload_mode))]
    pub async fn submit(&self, record: LogRecord) {
        match record.upload_mode {
            UploadMode::Immediate => self.upload_individual(record).await,
            UploadMode::Batched => self.enqueue(record).await,
        }
    }

    async fn upload_individual(&self, record: LogRecord) {
        self.stats.individual_sent.inc();
        match self.service.post_log(&record).await {
            Ok(()) => {
                self.stats.delivered.inc();
                debug!("log uploaded");
            }
            Err(err) if err.is_missing_parent() => {
                warn!(error = %err, "parent notebook missing; recovering");
                let result = self.recovery().recover_single(&record).await;
                match result {
                    Ok(()) => {}
                    Err(err) if err.is_transport() => {
                        warn!(error = %err, "parent recovery interrupted; queueing for batch delivery");
                        self.stats.requeued.inc();
                        self.enqueue(record.into_batched()).await;
                    }
                    Err(err) => {
                        error!(error = %err, "log dropped after failed parent recovery");
                        self.stats.dropped.inc();
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "immediate upload failed; queueing for batch delivery");
                self.stats.requeued.inc();
                self.enqueue(record.into_batched()).await;
            }
        }
    }

    async fn enqueue(&self, record: LogRecord) {
        let threshold_reached = {
            let mut state = self.state.lock();
            state.queue.push(record);
            if state.queue.len() >= self.config.max_batch_size && state.transport_failures == 0 {
                true
            } else {
                self.arm_timer(&mut state);
                false
            }
        };

        if threshold_reached {
            self.flush(false).await;
        }
    }

    /// Upload what is queued, in batches of at most `max_batch_size`
    ///
    /// A non-forced flush is skipped while another batch upload is in flight;
    /// the in-flight upload picks up the queue when it completes. A forced
    /// flush always runs and keeps going until the queue is empty or the
    /// collector is unreachable.
    #[instrument(skip(self))]
    pub async fn flush(&self, force: bool) {
        loop {
            let batch = {
                let mut state = self.state.lock();
                if state.in_flight > 0 && !force {
                    debug!(in_flight = state.in_flight, "flush deferred to in-flight upload");
                    return;
                }
                if let Some(timer) = state.timer.take() {
                    timer.cancel();
                }
                if state.queue.is_empty() {
                    return;
                }
                state.in_flight += 1;
                let take = state.queue.len().min(self.config.max_batch_size);
                state.queue.drain(..take).collect::<Vec<_>>()
            };

            let outcome = self.upload_batch(batch).await;

            let again = {
                let mut state = self.state.lock();
                state.in_flight -= 1;
                match outcome {
                    BatchOutcome::Settled => state.transport_failures = 0,
                    BatchOutcome::Requeued => {
                        state.transport_failures = state.transport_failures.saturating_add(1)
                    }
                }
                let more = outcome == BatchOutcome::Settled
                    && !state.queue.is_empty()
                    && (force || state.queue.len() >= self.config.max_batch_size);
                if !more && !state.queue.is_empty() {
                    self.arm_timer(&mut state);
                }
                more
            };

            if !again {
                return;
            }
        }
    }

    async fn upload_batch(&self, batch: Vec<LogRecord>) -> BatchOutcome {
        info!(batch_size = batch.len(), "uploading log batch");
        self.stats.batches_sent.inc();

        match self.service.post_batch(&batch).await {
            Ok(summary) => {
                self.stats.delivered.inc_by(summary.successful_items as u64);
                if summary.failures().next().is_none() {
                    return BatchOutcome::Settled;
                }
                warn!(
                    accepted = summary.successful_items,
                    failed = summary.failed_items,
                    "batch partially rejected"
                );
                let retry = self.recovery().recover_failed_items(&batch, &summary).await;
                if retry.is_empty() {
                    return BatchOutcome::Settled;
                }
                self.stats.requeued.inc_by(retry.len() as u64);
                self.requeue_front(retry);
                BatchOutcome::Requeued
            }
            Err(err) if err.is_transport() => {
                warn!(error = %err, batch_size = batch.len(), "batch upload failed; requeueing");
                self.stats.requeued.inc_by(batch.len() as u64);
                self.requeue_front(batch);
                BatchOutcome::Requeued
            }
            Err(err) if err.is_missing_parent() => {
                warn!(error = %err, "batch rejected for missing parent; recovering");
                let result = self.recovery().recover_whole_batch(&batch).await;
                match result {
                    Ok(summary) => {
                        self.stats.delivered.inc_by(summary.successful_items as u64);
                        let failed = summary.failures().count();
                        if failed > 0 {
                            error!(failed, "batch items still rejected after recovery; dropping");
                            self.stats.dropped.inc_by(failed as u64);
                        }
                        BatchOutcome::Settled
                    }
                    Err(err) if err.is_transport() => {
                        warn!(error = %err, batch_size = batch.len(), "batch recovery interrupted; requeueing");
                        self.stats.requeued.inc_by(batch.len() as u64);
                        self.requeue_front(batch);
                        BatchOutcome::Requeued
                    }
                    Err(err) => {
                        error!(error = %err, batch_size = batch.len(), "batch dropped after failed recovery");
                        self.stats.dropped.inc_by(batch.len() as u64);
                        BatchOutcome::Settled
                    }
                }
            }
            Err(err) => {
                error!(error = %err, batch_size = batch.len(), "batch rejected; dropping");
                self.stats.dropped.inc_by(batch.len() as u64);
                BatchOutcome::Settled
            }
        }
    }

    /// Put a failed batch back ahead of anything queued since
    fn requeue_front(&self, mut batch: Vec<LogRecord>) {
        let mut state = self.state.lock();
        batch.append(&mut state.queue);
        state.queue = batch;
    }

    fn recovery(&self) -> ParentRecovery<'_> {
        ParentRecovery::new(
            self.service.as_ref(),
            self.clock.as_ref(),
            &self.stats,
            self.config.legacy_error_matching,
        )
    }

    /// Start the batch timer unless one is already pending
    fn arm_timer(&self, state: &mut BatchState) {
        if state.timer.is_some() {
            return;
        }

        let token = CancellationToken::new();
        state.timer = Some(token.clone());
        self.stats.timers_armed.inc();
        let wait = self.timer_wait(state.transport_failures);
        debug!(wait = ?wait, "batch timer armed");

        let cancelled = token.clone();
        let manager = self.me.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(wait) => {
                    if let Some(manager) = manager.upgrade() {
                        manager.on_timer(&token).await;
                    }
                }
            }
        });
    }

    /// `max_wait`, doubled per consecutive transport failure beyond the first, up to 8x
    fn timer_wait(&self, transport_failures: u32) -> Duration {
        let factor = 1u32 << transport_failures.saturating_sub(1).min(3);
        self.config.max_wait.saturating_mul(factor)
    }

    async fn on_timer(&self, token: &CancellationToken) {
        {
            let mut state = self.state.lock();
            // A flush that ran in the meantime owns the queue now
            if token.is_cancelled() {
                return;
            }
            state.timer = None;
        }
        debug!("batch wait elapsed");
        self.flush(false).await;
    }
}
