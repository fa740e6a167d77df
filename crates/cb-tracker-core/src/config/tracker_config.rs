//! Tracker configuration model

use super::logging_config::LoggingConfig;
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default collector endpoint, same-origin with the notebook server
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8888/cb-server";

/// Suffix appended to content cut at a storage cap
pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// Idle detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Inactivity after which tracking pauses
    #[serde(with = "humantime_serde")]
    pub idle_threshold: Duration,
    /// How often the idle check runs
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(120),
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Hybrid delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Queue length that forces an immediate batch upload
    pub max_batch_size: usize,
    /// Longest a batched record waits before a timed flush
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
    /// Treat failure text mentioning `notebook`, `404` or `not found` as a
    /// missing parent when the collector sends no `error_code`
    pub legacy_error_matching: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            max_wait: Duration::from_secs(30),
            legacy_error_matching: false,
        }
    }
}

/// Copy/paste content handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Characters kept in the one-line preview
    pub preview_chars: usize,
    /// Characters kept in the stored, sanitized content
    pub storage_chars: usize,
    /// Minimum gap between two "activity is recorded" notices
    #[serde(with = "humantime_serde")]
    pub notice_interval: Duration,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            preview_chars: 100,
            storage_chars: 1000,
            notice_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Top-level tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the log collector (`/logs`, `/logs/batch`, `/notebooks`)
    pub server_url: String,
    /// Student identifier stamped on every record
    pub net_id: String,
    /// Course identifier stamped on every record
    pub course_id: String,
    /// Per-request timeout for collector calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Base URL of the host content API used for exports
    pub contents_url: Option<String>,
    /// Token for the host content API
    pub contents_token: Option<String>,
    /// Location of the daily goal file
    pub goals_path: Option<PathBuf>,
    pub activity: ActivityConfig,
    pub delivery: DeliveryConfig,
    pub content: ContentConfig,
    pub logging: LoggingConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            net_id: String::new(),
            course_id: String::new(),
            request_timeout: Duration::from_secs(30),
            contents_url: None,
            contents_token: None,
            goals_path: None,
            activity: ActivityConfig::default(),
            delivery: DeliveryConfig::default(),
            content: ContentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Check the configuration for values the tracker cannot run with
    pub fn validate(&self) -> TrackerResult<()> {
        if self.server_url.trim().is_empty() {
            return Err(TrackerError::config("server_url must not be empty"));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(TrackerError::config_with_context(
                "server_url must be an http(s) URL",
                format!("got '{}'", self.server_url),
            ));
        }
        if self.delivery.max_batch_size == 0 {
            return Err(TrackerError::config("delivery.max_batch_size must be at least 1"));
        }
        if self.delivery.max_wait.is_zero() {
            return Err(TrackerError::config("delivery.max_wait must be positive"));
        }
        if self.activity.idle_threshold.is_zero() || self.activity.poll_interval.is_zero() {
            return Err(TrackerError::config(
                "activity.idle_threshold and activity.poll_interval must be positive",
            ));
        }
        let marker = TRUNCATION_MARKER.chars().count();
        if self.content.storage_chars <= marker || self.content.preview_chars <= marker {
            return Err(TrackerError::config(format!(
                "content caps must exceed the {}-character truncation marker",
                marker
            )));
        }
        Ok(())
    }

    /// Resolve the goal file, falling back to the platform data directory
    pub fn goals_file(&self) -> PathBuf {
        self.goals_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cb-tracker")
                .join("goals.json")
        })
    }
}
