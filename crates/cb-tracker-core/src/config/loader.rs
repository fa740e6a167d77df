//! Configuration loading from files and environment variables

use super::tracker_config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load configuration from a file
///
/// Supports JSON and TOML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> TrackerResult<TrackerConfig> {
    if !path.exists() {
        return Ok(TrackerConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        TrackerError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: TrackerConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        _ => serde_json::from_str(&content).map_err(|e| {
            TrackerError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

/// Apply `CB_TRACKER_*` overrides using the given variable lookup
pub fn apply_env_overrides<F>(config: &mut TrackerConfig, lookup: F) -> TrackerResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("CB_TRACKER_SERVER_URL") {
        config.server_url = url;
    }
    if let Some(net_id) = lookup("CB_TRACKER_NET_ID") {
        config.net_id = net_id;
    }
    if let Some(course_id) = lookup("CB_TRACKER_COURSE_ID") {
        config.course_id = course_id;
    }
    if let Some(url) = lookup("CB_TRACKER_CONTENTS_URL") {
        config.contents_url = Some(url);
    }
    if let Some(token) = lookup("CB_TRACKER_CONTENTS_TOKEN") {
        config.contents_token = Some(token);
    }
    if let Some(size) = lookup("CB_TRACKER_MAX_BATCH_SIZE") {
        config.delivery.max_batch_size = size
            .parse()
            .map_err(|_| TrackerError::config("Invalid CB_TRACKER_MAX_BATCH_SIZE value"))?;
    }
    if let Some(wait) = lookup("CB_TRACKER_MAX_WAIT") {
        config.delivery.max_wait = parse_duration("CB_TRACKER_MAX_WAIT", &wait)?;
    }
    if let Some(idle) = lookup("CB_TRACKER_IDLE_THRESHOLD") {
        config.activity.idle_threshold = parse_duration("CB_TRACKER_IDLE_THRESHOLD", &idle)?;
    }
    if let Some(level) = lookup("CB_TRACKER_LOG_LEVEL") {
        config.logging.level = level;
    }
    Ok(())
}

fn parse_duration(var: &str, value: &str) -> TrackerResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value.trim()).map_err(|e| {
        TrackerError::config_with_context(
            format!("Invalid {} value: {}", var, e),
            format!("expected a duration like \"30s\", got '{}'", value),
        )
    })
}

/// Load configuration: file (if given), then environment overrides, then validation
pub fn load(path: Option<&Path>) -> TrackerResult<TrackerConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => TrackerConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
