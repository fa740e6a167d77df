//! Error types for the CodeBench tracker
//!
//! Delivery failures are classified here so the recovery path can branch on a
//! typed collector error code instead of scanning free-text messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Machine-readable failure code returned by the collector in `error_code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CollectorErrorCode {
    /// A log references a parent notebook the collector does not know
    MissingParent,
    /// The record being created already exists
    AlreadyExists,
    /// Any code this client does not interpret
    Other(String),
}

impl From<String> for CollectorErrorCode {
    fn from(code: String) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "missing_parent" | "notebook_not_found" | "parent_not_found" => Self::MissingParent,
            "already_exists" | "conflict" => Self::AlreadyExists,
            _ => Self::Other(code),
        }
    }
}

impl From<CollectorErrorCode> for String {
    fn from(code: CollectorErrorCode) -> Self {
        match code {
            CollectorErrorCode::MissingParent => "missing_parent".to_string(),
            CollectorErrorCode::AlreadyExists => "already_exists".to_string(),
            CollectorErrorCode::Other(other) => other,
        }
    }
}

impl fmt::Display for CollectorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

/// Main error type for the tracker
#[derive(Error, Debug, Clone)]
pub enum TrackerError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Network failure, timeout, or an undecodable reply
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        url: Option<String>,
    },

    /// The collector answered but reported failure
    #[error("Collector rejected request{}: {message}", status_suffix(.status))]
    Rejected {
        status: Option<u16>,
        code: Option<CollectorErrorCode>,
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl TrackerError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url: None,
        }
    }

    /// Create a rejection from an HTTP status and optional collector code
    pub fn rejected(
        status: Option<u16>,
        code: Option<CollectorErrorCode>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            status,
            code,
            message: message.into(),
        }
    }

    /// Create an IO error bound to a path
    pub fn io_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// The collector does not know the parent record a log refers to
    pub fn is_missing_parent(&self) -> bool {
        matches!(
            self,
            Self::Rejected { status: Some(404), .. }
                | Self::Rejected {
                    code: Some(CollectorErrorCode::MissingParent),
                    ..
                }
        )
    }

    /// The record being created already exists on the collector
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Rejected { status: Some(409), .. }
                | Self::Rejected {
                    code: Some(CollectorErrorCode::AlreadyExists),
                    ..
                }
        )
    }

    /// Network-level failure; the request may never have reached the collector
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for TrackerError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML config: {}", error))
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            message: error.to_string(),
            url: error.url().map(|u| u.to_string()),
        }
    }
}
