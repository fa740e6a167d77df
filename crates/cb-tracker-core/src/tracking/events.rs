//! Host notifications the tracker reacts to
//!
//! Serialized with an internal `event` tag so a recorded session can be stored
//! as JSON lines and replayed.

use serde::{Deserialize, Serialize};

/// Input signals that count as user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
    Scroll,
    MouseMove,
    KeyDown,
    MouseDown,
    Focus,
    Click,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// A document (tab) as the host describes it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Stable storage path; present for notebooks
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub widget_id: Option<String>,
    /// The notebook metadata marks it as an activebook
    #[serde(default)]
    pub activebook: bool,
}

impl DocumentRef {
    pub fn notebook(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Page identifier: path, then title, then widget id
    pub fn page_id(&self) -> String {
        [&self.path, &self.title, &self.widget_id]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// A cell and its position in the notebook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub id: String,
    pub index: i64,
}

impl CellRef {
    pub fn new(id: impl Into<String>, index: i64) -> Self {
        Self { id: id.into(), index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    Activity { signal: ActivitySignal },
    Focus,
    Blur,
    VisibilityChanged { visibility: Visibility },
    CurrentChanged { document: Option<DocumentRef> },
    NotebookOpened { document: DocumentRef },
    ActiveCellChanged {
        notebook_id: String,
        cell: Option<CellRef>,
    },
    DocumentDisposed { notebook_id: String },
    Copy { selection: String },
    Paste { clipboard: String },
    Teardown,
}

impl TrackerEvent {
    /// Short name for logs; never includes clipboard text
    pub fn name(&self) -> &'static str {
        match self {
            TrackerEvent::Activity { .. } => "activity",
            TrackerEvent::Focus => "focus",
            TrackerEvent::Blur => "blur",
            TrackerEvent::VisibilityChanged { .. } => "visibility_changed",
            TrackerEvent::CurrentChanged { .. } => "current_changed",
            TrackerEvent::NotebookOpened { .. } => "notebook_opened",
            TrackerEvent::ActiveCellChanged { .. } => "active_cell_changed",
            TrackerEvent::DocumentDisposed { .. } => "document_disposed",
            TrackerEvent::Copy { .. } => "copy",
            TrackerEvent::Paste { .. } => "paste",
            TrackerEvent::Teardown => "teardown",
        }
    }
}

/// An event with the wall-clock time it happened, as stored in recordings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_ms: i64,
    #[serde(flatten)]
    pub event: TrackerEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_id_prefers_path() {
        let doc = DocumentRef {
            path: Some("CS101/lab.ipynb".into()),
            title: Some("lab.ipynb".into()),
            widget_id: Some("w-1".into()),
            activebook: false,
        };
        assert_eq!(doc.page_id(), "CS101/lab.ipynb");

        let launcher = DocumentRef {
            path: None,
            title: Some(String::new()),
            widget_id: Some("launcher-0".into()),
            activebook: false,
        };
        assert_eq!(launcher.page_id(), "launcher-0");
        assert_eq!(DocumentRef::default().page_id(), "unknown");
    }

    #[test]
    fn test_timed_event_json_line() {
        let line = json!({
            "at_ms": 65000,
            "event": "active_cell_changed",
            "notebook_id": "nb.ipynb",
            "cell": { "id": "c1", "index": 2 }
        });
        let parsed: TimedEvent = serde_json::from_value(line).unwrap();
        assert_eq!(parsed.at_ms, 65_000);
        assert_eq!(
            parsed.event,
            TrackerEvent::ActiveCellChanged {
                notebook_id: "nb.ipynb".into(),
                cell: Some(CellRef::new("c1", 2)),
            }
        );

        let teardown: TimedEvent = serde_json::from_value(json!({"at_ms": 1, "event": "teardown"})).unwrap();
        assert_eq!(teardown.event, TrackerEvent::Teardown);
    }
}
