//! JSON envelopes exchanged with the collector

use crate::error::{CollectorErrorCode, TrackerError};
use crate::model::LogRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /logs/batch`
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<'a> {
    pub items: &'a [LogRecord],
}

/// Common reply envelope `{success, data?, error?, error_code?}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReply<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub error_code: Option<CollectorErrorCode>,
}

impl<T> ApiReply<T> {
    pub fn error_text(&self) -> String {
        self.error
            .as_ref()
            .map(value_text)
            .unwrap_or_else(|| "collector reported failure".to_string())
    }

    /// Failure envelope as an error, keeping the HTTP status when there was one
    pub fn into_error(self, status: Option<u16>) -> TrackerError {
        let message = self.error_text();
        TrackerError::rejected(status, self.error_code, message)
    }
}

/// `data` of a batch reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub successful_items: usize,
    #[serde(default)]
    pub failed_items: usize,
    #[serde(default)]
    pub results: Vec<ItemResult>,
}

impl BatchSummary {
    /// Every item accepted
    pub fn all_ok(total: usize) -> Self {
        Self {
            total_items: total,
            successful_items: total,
            failed_items: 0,
            results: (0..total).map(ItemResult::ok).collect(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|result| !result.success)
    }
}

/// Outcome of one batch item, addressed by its index in the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub index: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<CollectorErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ItemResult {
    pub fn ok(index: usize) -> Self {
        Self {
            index,
            success: true,
            data: None,
            error: None,
            error_code: None,
            status: None,
        }
    }

    pub fn failed(index: usize, code: Option<CollectorErrorCode>, error: impl Into<String>) -> Self {
        Self {
            index,
            success: false,
            data: None,
            error: Some(error.into()),
            error_code: code,
            status: None,
        }
    }

    /// Whether this failure means the parent notebook is unknown
    ///
    /// Decided by `error_code` or a per-item 404. The free-text fallback only
    /// applies when `legacy_text_matching` is on and the collector sent no code.
    pub fn is_missing_parent(&self, legacy_text_matching: bool) -> bool {
        if self.success {
            return false;
        }
        match &self.error_code {
            Some(code) => *code == CollectorErrorCode::MissingParent,
            None if self.status == Some(404) => true,
            None if legacy_text_matching => {
                let text = self.error.as_deref().unwrap_or_default().to_lowercase();
                text.contains("notebook") || text.contains("404") || text.contains("not found")
            }
            None => false,
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
