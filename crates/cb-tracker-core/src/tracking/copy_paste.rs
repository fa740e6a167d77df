//! Clipboard capture and paste provenance

use crate::config::ContentConfig;
use crate::content::{Sanitizer, classify, content_hash};
use crate::model::{ClipboardAction, ClipboardContext, CopyPasteRecord, LogInfo, SourceType};
use std::time::Duration;
use tracing::info;

/// Message shown when clipboard activity is recorded
pub const RECORDING_NOTICE: &str =
    "Heads up: your copy/paste activity is being recorded for your learning analytics.";

/// User-facing advisory channel
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Sends notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        info!(target: "cb_tracker::notice", "{}", message);
    }
}

/// Turns copy and paste events into sanitized records
#[derive(Debug, Clone)]
pub struct CopyPasteMonitor {
    sanitizer: Sanitizer,
    last_copied: Option<String>,
    last_notice_ms: Option<i64>,
    notice_interval_ms: i64,
}

impl CopyPasteMonitor {
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            sanitizer: Sanitizer::new(config),
            last_copied: None,
            last_notice_ms: None,
            notice_interval_ms: duration_ms(config.notice_interval),
        }
    }

    /// Whether the advisory notice is due; marks it shown when it is
    pub fn notice_due(&mut self, now_ms: i64) -> bool {
        let due = self
            .last_notice_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > self.notice_interval_ms);
        if due {
            self.last_notice_ms = Some(now_ms);
        }
        due
    }

    /// A copy; empty selections produce nothing
    pub fn on_copy(
        &mut self,
        selection: &str,
        context: ClipboardContext,
        now_ms: i64,
    ) -> Option<CopyPasteRecord> {
        if selection.is_empty() {
            return None;
        }
        self.last_copied = Some(selection.to_string());
        Some(self.record(ClipboardAction::Copy, selection, context, SourceType::Internal, now_ms))
    }

    /// A paste; internal only when it equals the last copied text exactly
    pub fn on_paste(
        &mut self,
        clipboard: &str,
        context: ClipboardContext,
        now_ms: i64,
    ) -> Option<CopyPasteRecord> {
        if clipboard.is_empty() {
            return None;
        }
        let source = if self.last_copied.as_deref() == Some(clipboard) {
            SourceType::Internal
        } else {
            SourceType::External
        };
        Some(self.record(ClipboardAction::Paste, clipboard, context, source, now_ms))
    }

    fn record(
        &self,
        action: ClipboardAction,
        raw: &str,
        context: ClipboardContext,
        source_type: SourceType,
        now_ms: i64,
    ) -> CopyPasteRecord {
        CopyPasteRecord {
            action,
            timestamp_ms: now_ms,
            content_length: raw.chars().count(),
            content_type: classify(raw),
            content_hash: content_hash(raw),
            sanitized_content: self.sanitizer.stored(raw),
            preview: self.sanitizer.preview(raw),
            context,
            source_type,
        }
    }
}

/// Collector payload for a captured record
pub fn log_info(record: &CopyPasteRecord) -> LogInfo {
    LogInfo::CopyPaste {
        notebook_id: record.context.notebook_id.clone(),
        cell_id: record.context.cell_id.clone(),
        pasted_content: record.sanitized_content.clone(),
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
