//! Configuration management for the tracker

pub mod loader;
pub mod logging_config;
pub mod tracker_config;

pub use loader::{apply_env_overrides, load, load_from_file};
pub use logging_config::LoggingConfig;
pub use tracker_config::{
    ActivityConfig, ContentConfig, DEFAULT_SERVER_URL, DeliveryConfig, TRUNCATION_MARKER,
    TrackerConfig,
};
