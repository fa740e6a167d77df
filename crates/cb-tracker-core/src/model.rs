//! Records produced by the trackers and shipped to the collector
//!
//! Field names on the wire follow the collector's snake_case contract
//! (`net_id`, `log_info`, `notebook_id`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a record should leave the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// Single-record POST attempted right away
    Immediate,
    /// Queued and flushed by size or time threshold
    #[default]
    Batched,
}

/// Kind-specific payload of a log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogInfo {
    /// Contiguous focused-window time
    Window { duration: u64 },
    /// Contiguous time on one notebook (or other page)
    Notebook { notebook_id: String, duration: u64 },
    /// Contiguous time on one cell of a notebook
    Cell {
        notebook_id: String,
        cell_id: String,
        duration: u64,
    },
    /// A copy or paste action and its sanitized content
    CopyPaste {
        notebook_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cell_id: Option<String>,
        pasted_content: String,
    },
}

impl LogInfo {
    /// The parent notebook this payload depends on, if any
    pub fn notebook_id(&self) -> Option<&str> {
        match self {
            LogInfo::Window { .. } => None,
            LogInfo::Notebook { notebook_id, .. }
            | LogInfo::Cell { notebook_id, .. }
            | LogInfo::CopyPaste { notebook_id, .. } => Some(notebook_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LogInfo::Window { .. } => "window",
            LogInfo::Notebook { .. } => "notebook",
            LogInfo::Cell { .. } => "cell",
            LogInfo::CopyPaste { .. } => "copy_paste",
        }
    }
}

/// One measurement addressed to the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "net_id")]
    pub subject_id: String,
    pub course_id: String,
    #[serde(rename = "log_info")]
    pub info: LogInfo,
    /// Local routing hint; never sent
    #[serde(skip)]
    pub upload_mode: UploadMode,
}

impl LogRecord {
    pub fn new(
        subject_id: impl Into<String>,
        course_id: impl Into<String>,
        info: LogInfo,
        upload_mode: UploadMode,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            course_id: course_id.into(),
            info,
            upload_mode,
        }
    }

    /// Same record, routed through the batch queue
    pub fn into_batched(mut self) -> Self {
        self.upload_mode = UploadMode::Batched;
        self
    }
}

/// Who is being measured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub net_id: String,
    pub course_id: String,
}

impl Identity {
    pub fn new(net_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            net_id: net_id.into(),
            course_id: course_id.into(),
        }
    }

    pub fn record(&self, info: LogInfo, upload_mode: UploadMode) -> LogRecord {
        LogRecord::new(&self.net_id, &self.course_id, info, upload_mode)
    }
}

/// Whole seconds between two epoch-millisecond timestamps, clamped at zero
pub fn whole_seconds(enter_ms: i64, leave_ms: i64) -> u64 {
    (leave_ms.saturating_sub(enter_ms).max(0) / 1000) as u64
}

/// A closed page (document/tab) session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVisitRecord {
    pub page_id: String,
    pub enter_ts: i64,
    pub leave_ts: i64,
    pub active_duration_seconds: u64,
}

impl PageVisitRecord {
    /// Close a session; `leave_ts` is clamped so it never precedes `enter_ts`
    pub fn close(page_id: impl Into<String>, enter_ts: i64, leave_ts: i64) -> Self {
        let leave_ts = leave_ts.max(enter_ts);
        Self {
            page_id: page_id.into(),
            enter_ts,
            leave_ts,
            active_duration_seconds: whole_seconds(enter_ts, leave_ts),
        }
    }
}

/// A closed cell session within a notebook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellVisitRecord {
    pub notebook_id: String,
    pub cell_id: String,
    pub cell_index: i64,
    pub enter_ts: i64,
    pub leave_ts: i64,
    pub active_duration_seconds: u64,
}

impl CellVisitRecord {
    pub fn close(
        notebook_id: impl Into<String>,
        cell_id: impl Into<String>,
        cell_index: i64,
        enter_ts: i64,
        leave_ts: i64,
    ) -> Self {
        let leave_ts = leave_ts.max(enter_ts);
        Self {
            notebook_id: notebook_id.into(),
            cell_id: cell_id.into(),
            cell_index,
            enter_ts,
            leave_ts,
            active_duration_seconds: whole_seconds(enter_ts, leave_ts),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardAction {
    Copy,
    Paste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Code,
    Markdown,
    Text,
    Unknown,
}

/// Where pasted content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Internal,
    External,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardContext {
    pub notebook_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
}

/// One captured copy or paste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPasteRecord {
    #[serde(rename = "type")]
    pub action: ClipboardAction,
    pub timestamp_ms: i64,
    pub content_length: usize,
    pub content_type: ContentType,
    pub content_hash: String,
    pub sanitized_content: String,
    pub preview: String,
    pub context: ClipboardContext,
    pub source_type: SourceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotebookKind {
    Activebook,
    Regular,
}

/// Parent record every notebook-scoped log depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookInfo {
    pub notebook_id: String,
    #[serde(rename = "net_id")]
    pub subject_id: String,
    pub course_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NotebookKind,
    pub topics: Vec<String>,
    #[serde(rename = "last_opened")]
    pub last_opened_iso: String,
}

impl NotebookInfo {
    /// Display name: the last path segment of the notebook id
    pub fn name_from_path(notebook_id: &str) -> String {
        notebook_id
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(notebook_id)
            .to_string()
    }

    /// Synthesize the parent implied by a log record, as recovery does
    pub fn from_log(record: &LogRecord, now: DateTime<Utc>) -> Option<Self> {
        let notebook_id = record.info.notebook_id()?;
        Some(Self {
            notebook_id: notebook_id.to_string(),
            subject_id: record.subject_id.clone(),
            course_id: record.course_id.clone(),
            name: Self::name_from_path(notebook_id),
            kind: NotebookKind::Regular,
            topics: Vec::new(),
            last_opened_iso: now.to_rfc3339(),
        })
    }

    /// Describe a notebook that was just opened in the host
    ///
    /// The course is the first path segment when the notebook sits inside a
    /// course folder; notebooks at the root fall back to `default_course`.
    pub fn for_opened(
        path: &str,
        identity: &Identity,
        activebook: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let segments: Vec<&str> = path.split('/').collect();
        let course_id = if segments.len() >= 2 && !segments[0].is_empty() {
            segments[0].to_string()
        } else {
            identity.course_id.clone()
        };
        Self {
            notebook_id: path.to_string(),
            subject_id: identity.net_id.clone(),
            course_id,
            name: Self::name_from_path(path),
            kind: if activebook {
                NotebookKind::Activebook
            } else {
                NotebookKind::Regular
            },
            topics: Vec::new(),
            last_opened_iso: now.to_rfc3339(),
        }
    }
}
