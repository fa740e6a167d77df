//! Manual export of the in-memory logs
//!
//! Not a delivery path: the documents written here are debugging and
//! self-reflection aids, saved either through the notebook server's contents
//! API or into a local directory.

use crate::error::{TrackerError, TrackerResult};
use crate::model::{ClipboardAction, CopyPasteRecord};
use crate::store::{CopyPasteCounts, StoreSnapshot};
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const LOGS_FILE: &str = "cb-tracker-logs.json";
pub const READABLE_LOGS_FILE: &str = "cb-tracker-logs-human-readable.json";
pub const COPY_PASTE_FILE: &str = "copy-paste-logs.json";

/// Number of recent previews in the copy/paste summary
const SUMMARY_RECENT: usize = 5;

/// Somewhere a named text document can be written
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSink: Send + Sync {
    async fn write(&self, file_name: &str, content: &str) -> TrackerResult<()>;
}

/// Notebook-server contents API (`PUT {base}/api/contents/{file}`)
#[derive(Debug, Clone)]
pub struct JupyterContentsSink {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl JupyterContentsSink {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> TrackerResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn file_url(&self, file_name: &str) -> String {
        format!("{}/api/contents/{}", self.base_url, file_name)
    }
}

#[async_trait]
impl ContentSink for JupyterContentsSink {
    async fn write(&self, file_name: &str, content: &str) -> TrackerResult<()> {
        let url = self.file_url(file_name);
        debug!(url = %url, bytes = content.len(), "saving through contents API");

        let mut request = self.http_client.put(&url).json(&json!({
            "type": "file",
            "format": "text",
            "content": content,
        }));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "contents API save failed: {}", error_text);
            return Err(TrackerError::rejected(
                Some(status.as_u16()),
                None,
                format!("Save of {} failed: {}", file_name, error_text),
            ));
        }
        Ok(())
    }
}

/// Plain files in a local directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ContentSink for DirectorySink {
    async fn write(&self, file_name: &str, content: &str) -> TrackerResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TrackerError::io_at(e.to_string(), self.dir.display().to_string()))?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| TrackerError::io_at(e.to_string(), path.display().to_string()))?;
        debug!(path = %path.display(), "export written");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogsExport<'a> {
    page_visits: &'a [crate::model::PageVisitRecord],
    copy_paste_activity: &'a [CopyPasteRecord],
    metadata: LogsMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogsMetadata {
    timestamp: i64,
    total_copy_paste_events: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadablePageVisit<'a> {
    page_id: &'a str,
    enter: String,
    leave: String,
    active_duration: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadableCellVisit<'a> {
    notebook_id: &'a str,
    cell_id: &'a str,
    cell_index: i64,
    enter: String,
    leave: String,
    active_duration: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadableExport<'a> {
    page_visits: Vec<ReadablePageVisit<'a>>,
    cell_visits: Vec<ReadableCellVisit<'a>>,
    copy_paste_activity: &'a [CopyPasteRecord],
    metadata: ReadableMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadableMetadata {
    timestamp: String,
    total_copy_paste_events: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyPasteExport<'a> {
    copy_paste_activity: &'a [CopyPasteRecord],
    metadata: CopyPasteMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyPasteMetadata {
    timestamp: i64,
    #[serde(flatten)]
    counts: CopyPasteCounts,
}

/// Epoch milliseconds as local wall-clock text
pub fn local_time(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// `cb-tracker-logs.json`: page visits and clipboard activity
pub fn logs_document(snapshot: &StoreSnapshot, now_ms: i64) -> TrackerResult<String> {
    let export = LogsExport {
        page_visits: &snapshot.page_visits,
        copy_paste_activity: &snapshot.copy_paste,
        metadata: LogsMetadata {
            timestamp: now_ms,
            total_copy_paste_events: snapshot.copy_paste.len(),
        },
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// `cb-tracker-logs-human-readable.json`: as above with local times and cell visits
pub fn readable_document(snapshot: &StoreSnapshot, now_ms: i64) -> TrackerResult<String> {
    let export = ReadableExport {
        page_visits: snapshot
            .page_visits
            .iter()
            .map(|visit| ReadablePageVisit {
                page_id: &visit.page_id,
                enter: local_time(visit.enter_ts),
                leave: local_time(visit.leave_ts),
                active_duration: visit.active_duration_seconds,
            })
            .collect(),
        cell_visits: snapshot
            .cell_visits
            .iter()
            .map(|visit| ReadableCellVisit {
                notebook_id: &visit.notebook_id,
                cell_id: &visit.cell_id,
                cell_index: visit.cell_index,
                enter: local_time(visit.enter_ts),
                leave: local_time(visit.leave_ts),
                active_duration: visit.active_duration_seconds,
            })
            .collect(),
        copy_paste_activity: &snapshot.copy_paste,
        metadata: ReadableMetadata {
            timestamp: local_time(now_ms),
            total_copy_paste_events: snapshot.copy_paste.len(),
        },
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// `copy-paste-logs.json`: clipboard activity and its counters
pub fn copy_paste_document(snapshot: &StoreSnapshot, now_ms: i64) -> TrackerResult<String> {
    let export = CopyPasteExport {
        copy_paste_activity: &snapshot.copy_paste,
        metadata: CopyPasteMetadata {
            timestamp: now_ms,
            counts: CopyPasteCounts::from_records(&snapshot.copy_paste),
        },
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Counters plus the most recent previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPasteSummary {
    #[serde(flatten)]
    pub counts: CopyPasteCounts,
    pub recent: Vec<String>,
}

impl CopyPasteSummary {
    pub fn from_records(records: &[CopyPasteRecord]) -> Self {
        let start = records.len().saturating_sub(SUMMARY_RECENT);
        Self {
            counts: CopyPasteCounts::from_records(records),
            recent: records[start..]
                .iter()
                .map(|record| {
                    let action = match record.action {
                        ClipboardAction::Copy => "copy",
                        ClipboardAction::Paste => "paste",
                    };
                    format!(
                        "{}: \"{}\" ({} chars)",
                        action, record.preview, record.content_length
                    )
                })
                .collect(),
        }
    }
}

impl fmt::Display for CopyPasteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Copy/Paste Summary:")?;
        writeln!(f, "Total events: {}", self.counts.total_events)?;
        writeln!(f, "Copies: {}", self.counts.total_copies)?;
        writeln!(f, "Pastes: {}", self.counts.total_pastes)?;
        writeln!(f, "Internal pastes: {}", self.counts.internal_pastes)?;
        writeln!(f, "External pastes: {}", self.counts.external_pastes)?;
        if !self.recent.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recent activity:")?;
            for line in &self.recent {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

/// Writes the three export documents to a sink
#[derive(Clone)]
pub struct Exporter {
    sink: Arc<dyn ContentSink>,
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter").finish_non_exhaustive()
    }
}

impl Exporter {
    pub fn new(sink: Arc<dyn ContentSink>) -> Self {
        Self { sink }
    }

    pub async fn save_logs(&self, snapshot: &StoreSnapshot, now_ms: i64) -> TrackerResult<()> {
        self.sink.write(LOGS_FILE, &logs_document(snapshot, now_ms)?).await?;
        info!(file = LOGS_FILE, page_visits = snapshot.page_visits.len(), "logs saved");
        Ok(())
    }

    pub async fn save_readable(&self, snapshot: &StoreSnapshot, now_ms: i64) -> TrackerResult<()> {
        self.sink
            .write(READABLE_LOGS_FILE, &readable_document(snapshot, now_ms)?)
            .await?;
        info!(file = READABLE_LOGS_FILE, "readable logs saved");
        Ok(())
    }

    pub async fn save_copy_paste(&self, snapshot: &StoreSnapshot, now_ms: i64) -> TrackerResult<()> {
        self.sink
            .write(COPY_PASTE_FILE, &copy_paste_document(snapshot, now_ms)?)
            .await?;
        info!(file = COPY_PASTE_FILE, events = snapshot.copy_paste.len(), "copy/paste logs saved");
        Ok(())
    }
}
