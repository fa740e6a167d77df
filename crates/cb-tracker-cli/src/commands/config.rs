//! Configuration management commands

use crate::console::CliConsole;
use cb_tracker_core::TrackerConfig;
use std::path::Path;

/// Show the effective configuration (file, then environment overrides)
pub fn show(config: &TrackerConfig, config_file: Option<&Path>) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration");

    match config_file {
        Some(path) if path.exists() => {
            console.success(&format!("Loaded configuration from: {}", path.display()))
        }
        Some(path) => {
            console.warn(&format!("Configuration file not found: {}", path.display()));
            console.info("Using default configuration");
        }
        None => console.info("No configuration file given; defaults plus environment"),
    }

    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Validate the effective configuration
pub fn validate(config: &TrackerConfig) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Validation");

    match config.validate() {
        Ok(()) => {
            console.success("Configuration is valid");
            console.print_separator();
            console.field("Collector", &config.server_url);
            console.field(
                "Identity",
                format!("{} / {}", or_unset(&config.net_id), or_unset(&config.course_id)),
            );
            console.field(
                "Batching",
                format!(
                    "{} logs or {:?}",
                    config.delivery.max_batch_size, config.delivery.max_wait
                ),
            );
            console.field("Idle threshold", format!("{:?}", config.activity.idle_threshold));
            console.field(
                "Contents API",
                config.contents_url.as_deref().unwrap_or("(not configured)"),
            );
            console.field("Goals file", config.goals_file().display());
            if config.net_id.is_empty() || config.course_id.is_empty() {
                console.warn("net_id/course_id are empty; logs will not be attributable");
            }
            Ok(())
        }
        Err(e) => {
            console.error(&format!("Configuration validation failed: {}", e));
            Err(e.into())
        }
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(unset)" } else { value }
}
